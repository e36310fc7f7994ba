use thiserror::Error;

use crate::db::BookingStatus;

/// Per-request authentication and authorization failures.
///
/// None of these are fatal to the process.
#[derive(Error, Debug)]
pub enum AccessError {
    /// No credential, or one that failed decoding, expiry or account lookup.
    /// The message never says which check failed.
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Request data the operation cannot act on
    #[error("{0}")]
    BadRequest(String),

    #[error("Booking cannot move from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AccessError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
