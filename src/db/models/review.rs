//! Review and favorite models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub booking_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: i64,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub service_id: i64,
    pub created_at: String,
}

/// Favorite joined with the service it points at
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FavoriteWithService {
    pub id: i64,
    pub service_id: i64,
    pub service_title: Option<String>,
    pub service_price: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFavoriteRequest {
    pub service_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteCheckResponse {
    pub is_favorite: bool,
}
