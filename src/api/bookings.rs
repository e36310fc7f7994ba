use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::Principal;
use crate::bookings;
use crate::db::{Booking, CreateBookingRequest, StatusQuery};
use crate::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking =
        bookings::create_booking(&state.db, &principal, req.service_id, req.start_at).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(bookings::list_bookings(&state.db, &principal).await?))
}

/// Regular transition, guarded per target status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Booking>, ApiError> {
    let booking =
        bookings::transition_booking(&state.db, &principal, id, &query.new_status, false).await?;
    Ok(Json(booking))
}

/// Admin correction that ignores the adjacency table
pub async fn override_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Booking>, ApiError> {
    let booking =
        bookings::transition_booking(&state.db, &principal, id, &query.new_status, true).await?;
    Ok(Json(booking))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    bookings::delete_booking(&state.db, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
