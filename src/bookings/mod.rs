//! Booking lifecycle: creation in `pending` and guarded status transitions.

pub mod lifecycle;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::auth::{authorize, policy, require_role, AccessError, Principal};
use crate::db::{Booking, BookingStatus, BookingStore, NewBooking, Role, ServiceStore};

/// Book `service_id` starting at `start_at` on behalf of a client.
///
/// The end time is always derived from the service duration and the status
/// is always `pending`.
pub async fn create_booking<S>(
    store: &S,
    principal: &Principal,
    service_id: i64,
    start_at: DateTime<Utc>,
) -> Result<Booking, AccessError>
where
    S: BookingStore + ServiceStore + ?Sized,
{
    authorize(principal, &policy::BOOKING_CREATORS, None)
        .map_err(|_| AccessError::forbidden("Only clients can create bookings"))?;

    let service = store
        .find_service_by_id(service_id)
        .await?
        .ok_or_else(|| AccessError::not_found("Service not found"))?;

    let end_at = Duration::try_minutes(service.duration)
        .and_then(|duration| start_at.checked_add_signed(duration))
        .ok_or_else(|| AccessError::BadRequest("start_at is out of range".to_string()))?;

    let booking = store
        .insert_booking(&NewBooking {
            client_id: principal.id,
            freelancer_id: service.freelancer_id,
            service_id: service.id,
            start_at,
            end_at,
        })
        .await?;

    info!(
        booking_id = booking.id,
        client_id = booking.client_id,
        service_id = booking.service_id,
        "Booking created"
    );
    Ok(booking)
}

/// Move a booking to `target`.
///
/// With `admin_override` only admins pass, and any valid status may be set.
/// Otherwise the per-status policy decides, and the move must exist in the
/// adjacency table.
pub async fn transition_booking<S>(
    store: &S,
    principal: &Principal,
    booking_id: i64,
    target: &str,
    admin_override: bool,
) -> Result<Booking, AccessError>
where
    S: BookingStore + ?Sized,
{
    let mut booking = store
        .find_booking_by_id(booking_id)
        .await?
        .ok_or_else(|| AccessError::not_found("Booking not found"))?;

    let target: BookingStatus = target
        .parse()
        .map_err(|_| AccessError::InvalidStatus(target.to_string()))?;

    let from = booking.status;
    if admin_override {
        require_role(principal, &[Role::Admin])
            .map_err(|_| AccessError::forbidden("Admins only"))?;
    } else {
        let rule = lifecycle::transition_policy(target).ok_or_else(|| {
            AccessError::forbidden(format!(
                "You are not allowed to mark this booking as {}",
                target
            ))
        })?;
        authorize(principal, rule, Some(&booking)).map_err(|e| match e {
            AccessError::Forbidden(reason) => AccessError::forbidden(format!(
                "You are not allowed to mark this booking as {}: {}",
                target, reason
            )),
            other => other,
        })?;

        if !lifecycle::can_transition(from, target) {
            debug!(booking_id, %from, to = %target, "Rejected transition");
            return Err(AccessError::InvalidTransition { from, to: target });
        }
    }

    booking.status = target;
    let booking = store.save_booking(&booking).await?;

    info!(
        booking_id,
        user_id = principal.id,
        %from,
        to = %target,
        admin_override,
        "Booking status changed"
    );
    Ok(booking)
}

/// Bookings visible to the principal
pub async fn list_bookings<S>(store: &S, principal: &Principal) -> Result<Vec<Booking>, AccessError>
where
    S: BookingStore + ?Sized,
{
    Ok(store.list_bookings_for(principal.id, principal.role).await?)
}

/// Delete a booking as one of its parties or as an admin
pub async fn delete_booking<S>(
    store: &S,
    principal: &Principal,
    booking_id: i64,
) -> Result<(), AccessError>
where
    S: BookingStore + ?Sized,
{
    let booking = store
        .find_booking_by_id(booking_id)
        .await?
        .ok_or_else(|| AccessError::not_found("Booking not found"))?;

    authorize(principal, &policy::BOOKING_REMOVERS, Some(&booking))
        .map_err(|_| AccessError::forbidden("You are not authorized to delete this booking"))?;

    store.delete_booking(booking.id).await?;
    info!(booking_id, user_id = principal.id, "Booking deleted");
    Ok(())
}
