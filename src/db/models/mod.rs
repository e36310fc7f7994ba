//! Database models split into domain-specific modules.

pub mod availability;
pub mod booking;
pub mod review;
pub mod service;
pub mod user;

pub use availability::*;
pub use booking::*;
pub use review::*;
pub use service::*;
pub use user::*;
