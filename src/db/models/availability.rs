//! Weekly availability slots.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub freelancer_id: i64,
    /// 0 = Monday, 6 = Sunday
    pub day_of_week: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub day_of_week: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
