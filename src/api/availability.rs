use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_day_of_week, validate_time_range};
use crate::auth::{authorize, evaluate, policy, Decision, Principal};
use crate::db::{AvailabilitySlot, CreateSlotRequest};
use crate::AppState;

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<AvailabilitySlot>), ApiError> {
    authorize(&principal, &policy::FREELANCER_ONLY, None)
        .map_err(|_| ApiError::forbidden("Only freelancers can create availability slots"))?;

    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("day_of_week", validate_day_of_week(req.day_of_week))
        .check("end_time", validate_time_range(req.start_time, req.end_time));
    errors.finish()?;

    let slot = sqlx::query_as::<_, AvailabilitySlot>(
        r#"
        INSERT INTO availability_slots (freelancer_id, day_of_week, start_time, end_time)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(principal.id)
    .bind(req.day_of_week)
    .bind(req.start_time)
    .bind(req.end_time)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(slot_id = slot.id, user_id = principal.id, "Availability slot created");
    Ok((StatusCode::CREATED, Json(slot)))
}

/// The caller's own slots
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<AvailabilitySlot>>, ApiError> {
    authorize(&principal, &policy::FREELANCER_ONLY, None)
        .map_err(|_| ApiError::forbidden("Only freelancers can view their slots"))?;

    let slots = sqlx::query_as::<_, AvailabilitySlot>(
        "SELECT * FROM availability_slots WHERE freelancer_id = ? ORDER BY day_of_week, start_time",
    )
    .bind(principal.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(slots))
}

/// Someone else's slot is reported as missing
pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let slot = sqlx::query_as::<_, AvailabilitySlot>("SELECT * FROM availability_slots WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    let slot = match slot {
        Some(slot) if evaluate(&principal, &policy::SLOT_OWNER, Some(&slot)) == Decision::Allow => {
            slot
        }
        _ => return Err(ApiError::not_found("Slot not found or unauthorized")),
    };

    sqlx::query("DELETE FROM availability_slots WHERE id = ?")
        .bind(slot.id)
        .execute(&state.db)
        .await?;

    tracing::info!(slot_id = id, user_id = principal.id, "Availability slot deleted");
    Ok(StatusCode::NO_CONTENT)
}
