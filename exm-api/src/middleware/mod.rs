//! HTTP middleware

pub mod auth;
pub mod rate_limit;

pub use auth::require_admin;
pub use rate_limit::{limit_api, limit_contact, RateLimits};
