//! Signed, time-limited access tokens.
//!
//! Tokens are HMAC-signed JWTs carrying the subject id, role, username,
//! issue time and expiry. They are signed, not encrypted. Decoding checks the
//! signature and the claim invariants but deliberately ignores `exp`: the
//! principal resolver owns expiry enforcement.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::db::{Account, Role};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id in string form
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for `account` valid from `now` for `lifetime`
    pub fn for_account(account: &Account, now: DateTime<Utc>, lifetime: Duration) -> Result<Self> {
        let expires_at = now
            .checked_add_signed(lifetime)
            .context("Token expiry is out of range")?;
        Ok(Self {
            sub: account.id.to_string(),
            role: account.role,
            username: Some(account.username.clone()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    pub fn subject_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Wire form: everything optional so that absent claims are reported as
/// `InvalidToken` instead of leaking serde errors.
#[derive(Debug, Deserialize)]
struct WireClaims {
    sub: Option<String>,
    role: Option<String>,
    username: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
}

impl WireClaims {
    fn into_claims(self) -> Result<Claims, TokenError> {
        let sub = self.sub.filter(|s| !s.is_empty()).ok_or(TokenError::InvalidToken)?;
        if sub.parse::<i64>().is_err() {
            return Err(TokenError::InvalidToken);
        }
        let role = self
            .role
            .and_then(|r| Role::from_str(&r).ok())
            .ok_or(TokenError::InvalidToken)?;
        let exp = self.exp.ok_or(TokenError::InvalidToken)?;

        Ok(Claims {
            sub,
            role,
            username: self.username,
            iat: self.iat.unwrap_or_default(),
            exp,
        })
    }
}

/// Encoder/decoder bound to one signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .with_context(|| format!("Unknown JWT algorithm: {}", config.algorithm))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            anyhow::bail!("Only HMAC algorithms are supported, got {:?}", algorithm);
        }
        if config.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }
        if config.token_ttl_minutes <= 0 {
            anyhow::bail!("Token lifetime must be positive");
        }
        let lifetime = Duration::try_minutes(config.token_ttl_minutes)
            .context("Token lifetime is out of range")?;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            lifetime,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for a freshly authenticated account
    pub fn issue(&self, account: &Account) -> Result<String> {
        self.encode(&Claims::for_account(account, Utc::now(), self.lifetime)?)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .context("Failed to encode access token")
    }

    /// Verify the signature and claim invariants. Expired tokens still decode.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::InvalidToken)?;
        data.claims.into_claims()
    }
}
