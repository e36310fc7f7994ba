use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_comment, validate_rating};
use crate::auth::{authorize, policy, AccessError, Principal};
use crate::db::{Booking, BookingStore, CreateReviewRequest, Review, UpdateReviewRequest};
use crate::AppState;

async fn booking_or_404(state: &AppState, id: i64) -> Result<Booking, ApiError> {
    state
        .db
        .find_booking_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))
}

async fn review_or_404(state: &AppState, id: i64) -> Result<Review, ApiError> {
    sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))
}

/// Reviews are authorized through the booking they belong to
async fn authorize_author(
    state: &AppState,
    principal: &Principal,
    booking_id: i64,
) -> Result<(), ApiError> {
    let booking = booking_or_404(state, booking_id).await?;
    authorize(principal, &policy::REVIEW_AUTHOR, Some(&booking))
        .map_err(|_| ApiError::forbidden("You do not own this booking"))
}

fn validate_review(rating: i64, comment: &Option<String>) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("rating", validate_rating(rating))
        .check("comment", validate_comment(comment));
    errors.finish()
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    authorize_author(&state, &principal, req.booking_id).await?;
    validate_review(req.rating, &req.comment)?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM reviews WHERE booking_id = ?")
        .bind(req.booking_id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(
            AccessError::Conflict("Review already exists for this booking".to_string()).into(),
        );
    }

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (booking_id, rating, comment) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(req.booking_id)
    .bind(req.rating)
    .bind(&req.comment)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(review_id = review.id, booking_id = req.booking_id, "Review created");
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<Review>>, ApiError> {
    authorize(&principal, &policy::ADMIN_ONLY, None)
        .map_err(|_| ApiError::forbidden("Admins only"))?;

    let reviews = sqlx::query_as::<_, Review>("SELECT * FROM reviews ORDER BY id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(reviews))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = review_or_404(&state, id).await?;
    authorize_author(&state, &principal, review.booking_id).await?;
    validate_review(req.rating, &req.comment)?;

    let review = sqlx::query_as::<_, Review>(
        "UPDATE reviews SET rating = ?, comment = ? WHERE id = ? RETURNING *",
    )
    .bind(req.rating)
    .bind(&req.comment)
    .bind(review.id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(review_id = id, user_id = principal.id, "Review updated");
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let review = review_or_404(&state, id).await?;
    authorize_author(&state, &principal, review.booking_id).await?;

    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(review.id)
        .execute(&state.db)
        .await?;

    tracing::info!(review_id = id, user_id = principal.id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}
