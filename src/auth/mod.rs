//! Authentication and authorization core.
//!
//! - [`token`]: signed access tokens
//! - [`principal`]: request credential to [`Principal`]
//! - [`policy`]: declarative access rules
//! - [`password`]: credential hashing and verification

mod error;
pub mod password;
pub mod policy;
pub mod principal;
pub mod token;

pub use error::AccessError;
pub use password::{hash_password, verify_password, Argon2Verifier, CredentialVerifier};
pub use policy::{authorize, evaluate, require_role, Decision, Denial, Policy, Relation, Resource};
pub use principal::{resolve_principal, try_resolve_principal, Principal};
pub use token::{Claims, TokenCodec, TokenError};
