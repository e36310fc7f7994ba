//! Service models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::Role;

/// A bookable offering published by a freelancer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub freelancer_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    /// Length of one booking in minutes
    pub duration: i64,
    pub created_by_role: Role,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub duration: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<i64>,
}
