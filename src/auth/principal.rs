//! Turning a request credential into a trusted [`Principal`].

use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::AccessError;
use super::token::TokenCodec;
use crate::db::{AccountStore, Role};

/// Identity resolved for the current request. Rebuilt per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: i64,
    /// Read from the account record, never from the token
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// Token from `Authorization: Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Token carried in the named cookie
pub fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Strict resolution: bearer header first, then the cookie.
///
/// Every credential problem collapses to [`AccessError::Unauthenticated`];
/// only store failures surface as something else.
pub async fn resolve_principal<A>(
    headers: &HeaderMap,
    codec: &TokenCodec,
    cookie_name: &str,
    accounts: &A,
) -> Result<Principal, AccessError>
where
    A: AccountStore + ?Sized,
{
    let token = match bearer_token(headers) {
        Some(token) => token.to_string(),
        None => cookie_token(headers, cookie_name).ok_or_else(|| {
            debug!("No credential presented");
            AccessError::Unauthenticated
        })?,
    };

    authenticate(&token, codec, accounts, Utc::now()).await
}

/// Best-effort resolution for callers that redirect instead of failing.
///
/// Only the bearer header is consulted. Any failure, including a store
/// error, yields `None`.
pub async fn try_resolve_principal<A>(
    headers: &HeaderMap,
    codec: &TokenCodec,
    accounts: &A,
) -> Option<Principal>
where
    A: AccountStore + ?Sized,
{
    let token = bearer_token(headers)?;
    match authenticate(token, codec, accounts, Utc::now()).await {
        Ok(principal) => Some(principal),
        Err(AccessError::Store(e)) => {
            warn!(error = %e, "Account lookup failed during best-effort resolution");
            None
        }
        Err(_) => None,
    }
}

async fn authenticate<A>(
    token: &str,
    codec: &TokenCodec,
    accounts: &A,
    now: DateTime<Utc>,
) -> Result<Principal, AccessError>
where
    A: AccountStore + ?Sized,
{
    let claims = codec.decode(token).map_err(|_| {
        debug!("Rejected token: signature or claims invalid");
        AccessError::Unauthenticated
    })?;

    if claims.is_expired_at(now) {
        debug!(sub = %claims.sub, "Rejected token: expired");
        return Err(AccessError::Unauthenticated);
    }

    let (Some(user_id), Some(expires_at)) = (claims.subject_id(), claims.expires_at()) else {
        return Err(AccessError::Unauthenticated);
    };

    let account = accounts.find_account_by_id(user_id).await?.ok_or_else(|| {
        debug!(user_id, "Rejected token: account no longer exists");
        AccessError::Unauthenticated
    })?;

    if account.role != claims.role {
        debug!(
            user_id,
            token_role = %claims.role,
            stored_role = %account.role,
            "Token role is stale, using stored role"
        );
    }

    Ok(Principal {
        id: account.id,
        role: account.role,
        expires_at,
    })
}
