//! Store seams consumed by the auth and booking core.
//!
//! The core only depends on these traits; `SqlitePool` is the production
//! implementation.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::models::{Account, Booking, NewBooking, Role, Service};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error>;

    /// Login identifiers match either column
    async fn find_account_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, sqlx::Error>;

    async fn insert_account(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Account, sqlx::Error>;
}

#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn find_service_by_id(&self, id: i64) -> Result<Option<Service>, sqlx::Error>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_booking_by_id(&self, id: i64) -> Result<Option<Booking>, sqlx::Error>;

    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking, sqlx::Error>;

    /// Persist the mutable part of a booking (its status)
    async fn save_booking(&self, booking: &Booking) -> Result<Booking, sqlx::Error>;

    /// Bookings visible to a role: own side for clients and freelancers, all for admins
    async fn list_bookings_for(&self, user_id: i64, role: Role)
        -> Result<Vec<Booking>, sqlx::Error>;

    async fn delete_booking(&self, id: i64) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl AccountStore for SqlitePool {
    async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self)
            .await
    }

    async fn find_account_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users WHERE username = ? OR email = ? LIMIT 1")
            .bind(identifier)
            .bind(identifier)
            .fetch_optional(self)
            .await
    }

    async fn insert_account(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self)
        .await
    }
}

#[async_trait]
impl ServiceStore for SqlitePool {
    async fn find_service_by_id(&self, id: i64) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

#[async_trait]
impl BookingStore for SqlitePool {
    async fn find_booking_by_id(&self, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(self)
            .await
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (client_id, freelancer_id, service_id, start_at, end_at, status)
            VALUES (?, ?, ?, ?, ?, 'pending')
            RETURNING *
            "#,
        )
        .bind(booking.client_id)
        .bind(booking.freelancer_id)
        .bind(booking.service_id)
        .bind(booking.start_at)
        .bind(booking.end_at)
        .fetch_one(self)
        .await
    }

    async fn save_booking(&self, booking: &Booking) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = ? WHERE id = ? RETURNING *")
            .bind(booking.status)
            .bind(booking.id)
            .fetch_one(self)
            .await
    }

    async fn list_bookings_for(
        &self,
        user_id: i64,
        role: Role,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        match role {
            Role::Client => {
                sqlx::query_as::<_, Booking>(
                    "SELECT * FROM bookings WHERE client_id = ? ORDER BY start_at",
                )
                .bind(user_id)
                .fetch_all(self)
                .await
            }
            Role::Freelancer => {
                sqlx::query_as::<_, Booking>(
                    "SELECT * FROM bookings WHERE freelancer_id = ? ORDER BY start_at",
                )
                .bind(user_id)
                .fetch_all(self)
                .await
            }
            Role::Admin => {
                sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY start_at")
                    .fetch_all(self)
                    .await
            }
        }
    }

    async fn delete_booking(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(self)
            .await?;
        Ok(())
    }
}
