//! Declarative access policies and their evaluation.
//!
//! Policies are plain values so they can be inspected and tested without an
//! HTTP stack. Ownership is expressed as a [`Relation`] that a [`Resource`]
//! resolves to an account id.

use serde::Serialize;
use tracing::debug;

use super::error::AccessError;
use super::principal::Principal;
use crate::db::{AvailabilitySlot, Booking, Role, Service};

/// How an account is attached to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// The client side of a booking
    Client,
    /// The freelancer delivering a booking or offering a service
    Freelancer,
    /// Whoever created the resource
    Owner,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Client => write!(f, "client"),
            Relation::Freelancer => write!(f, "freelancer"),
            Relation::Owner => write!(f, "owner"),
        }
    }
}

/// Something ownership policies can be checked against
pub trait Resource {
    /// Short noun used in denial messages
    fn kind(&self) -> &'static str;

    /// Account holding `relation`, if the resource has one
    fn holder(&self, relation: Relation) -> Option<i64>;
}

impl Resource for Booking {
    fn kind(&self) -> &'static str {
        "booking"
    }

    fn holder(&self, relation: Relation) -> Option<i64> {
        match relation {
            Relation::Client | Relation::Owner => Some(self.client_id),
            Relation::Freelancer => Some(self.freelancer_id),
        }
    }
}

impl Resource for Service {
    fn kind(&self) -> &'static str {
        "service"
    }

    fn holder(&self, relation: Relation) -> Option<i64> {
        match relation {
            Relation::Freelancer | Relation::Owner => Some(self.freelancer_id),
            Relation::Client => None,
        }
    }
}

impl Resource for AvailabilitySlot {
    fn kind(&self) -> &'static str {
        "availability slot"
    }

    fn holder(&self, relation: Relation) -> Option<i64> {
        match relation {
            Relation::Freelancer | Relation::Owner => Some(self.freelancer_id),
            Relation::Client => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Any resolved principal
    Authenticated,
    /// Principal's role is one of these
    Roles(&'static [Role]),
    /// Principal holds the relation on the target resource
    Owner(Relation),
    /// Every member allows
    All(&'static [Policy]),
    /// At least one member allows
    Any(&'static [Policy]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    WrongRole { allowed: Vec<Role>, actual: Role },
    NotOwner { resource: &'static str, relation: Relation },
    /// An ownership rule had nothing to check against
    ResourceMissing,
}

impl Denial {
    pub fn reason(&self) -> String {
        match self {
            Denial::WrongRole { allowed, actual } => {
                let allowed: Vec<&str> = allowed.iter().map(Role::as_str).collect();
                format!(
                    "Role '{}' is not permitted (requires one of: {})",
                    actual,
                    allowed.join(", ")
                )
            }
            Denial::NotOwner { resource, relation } => {
                format!("You are not the {} of this {}", relation, resource)
            }
            Denial::ResourceMissing => "Resource not found".to_string(),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason())
    }
}

impl From<Denial> for AccessError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::ResourceMissing => AccessError::NotFound(denial.reason()),
            Denial::WrongRole { .. } | Denial::NotOwner { .. } => {
                AccessError::Forbidden(denial.reason())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate `policy` for `principal` against an optional target.
///
/// `Any` reports the denial of its last member unless one of the members
/// found the resource missing, which wins so that 404 is not masked by 403.
pub fn evaluate(
    principal: &Principal,
    policy: &Policy,
    resource: Option<&dyn Resource>,
) -> Decision {
    match policy {
        Policy::Authenticated => Decision::Allow,
        Policy::Roles(roles) => {
            if principal.has_any_role(roles) {
                Decision::Allow
            } else {
                Decision::Deny(Denial::WrongRole {
                    allowed: roles.to_vec(),
                    actual: principal.role,
                })
            }
        }
        Policy::Owner(relation) => match resource {
            None => Decision::Deny(Denial::ResourceMissing),
            Some(resource) if resource.holder(*relation) == Some(principal.id) => Decision::Allow,
            Some(resource) => Decision::Deny(Denial::NotOwner {
                resource: resource.kind(),
                relation: *relation,
            }),
        },
        Policy::All(members) => {
            for member in members.iter() {
                if let Decision::Deny(denial) = evaluate(principal, member, resource) {
                    return Decision::Deny(denial);
                }
            }
            Decision::Allow
        }
        Policy::Any(members) => {
            let mut last = None;
            for member in members.iter() {
                match evaluate(principal, member, resource) {
                    Decision::Allow => return Decision::Allow,
                    Decision::Deny(Denial::ResourceMissing) => {
                        return Decision::Deny(Denial::ResourceMissing)
                    }
                    Decision::Deny(denial) => last = Some(denial),
                }
            }
            Decision::Deny(last.unwrap_or(Denial::WrongRole {
                allowed: Vec::new(),
                actual: principal.role,
            }))
        }
    }
}

/// Evaluate and turn a denial into the matching [`AccessError`]
pub fn authorize(
    principal: &Principal,
    policy: &Policy,
    resource: Option<&dyn Resource>,
) -> Result<(), AccessError> {
    match evaluate(principal, policy, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(denial) => {
            debug!(user_id = principal.id, role = %principal.role, reason = %denial, "Access denied");
            Err(denial.into())
        }
    }
}

/// Fail with `Forbidden` unless the principal has one of `allowed`
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AccessError> {
    if principal.has_any_role(allowed) {
        return Ok(());
    }
    let denial = Denial::WrongRole {
        allowed: allowed.to_vec(),
        actual: principal.role,
    };
    debug!(user_id = principal.id, reason = %denial, "Access denied");
    Err(denial.into())
}

// Route policies

pub const ADMIN_ONLY: Policy = Policy::Roles(&[Role::Admin]);

pub const FREELANCER_ONLY: Policy = Policy::Roles(&[Role::Freelancer]);

pub const SERVICE_VIEWERS: Policy = Policy::Roles(&[Role::Admin, Role::Freelancer]);

pub const SERVICE_AUTHORS: Policy = Policy::Roles(&[Role::Freelancer, Role::Admin]);

/// Admins edit any service, freelancers only their own
pub const SERVICE_EDITORS: Policy = Policy::Any(&[
    Policy::Roles(&[Role::Admin]),
    Policy::All(&[
        Policy::Roles(&[Role::Freelancer]),
        Policy::Owner(Relation::Freelancer),
    ]),
]);

pub const SLOT_OWNER: Policy = Policy::All(&[
    Policy::Roles(&[Role::Freelancer]),
    Policy::Owner(Relation::Freelancer),
]);

/// Reviews belong to the client of the reviewed booking
pub const REVIEW_AUTHOR: Policy = Policy::Owner(Relation::Client);

pub const BOOKING_CREATORS: Policy = Policy::Roles(&[Role::Client]);

/// Either party of the booking, or an admin
pub const BOOKING_REMOVERS: Policy = Policy::Any(&[
    Policy::Roles(&[Role::Admin]),
    Policy::All(&[Policy::Roles(&[Role::Client]), Policy::Owner(Relation::Client)]),
    Policy::All(&[
        Policy::Roles(&[Role::Freelancer]),
        Policy::Owner(Relation::Freelancer),
    ]),
]);
