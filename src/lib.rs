pub mod api;
pub mod auth;
pub mod bookings;
pub mod config;
pub mod db;

pub use db::DbPool;

use anyhow::Result;
use config::Config;
use std::sync::Arc;

use crate::auth::{Argon2Verifier, CredentialVerifier, TokenCodec};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub tokens: TokenCodec,
    pub passwords: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Build the shared state. Fails if the signing configuration is unusable.
    pub fn new(config: Config, db: DbPool) -> Result<Self> {
        let tokens = TokenCodec::new(&config.auth)?;
        Ok(Self {
            config,
            db,
            tokens,
            passwords: Arc::new(Argon2Verifier),
        })
    }
}
