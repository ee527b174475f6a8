//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared wire types
//!
//! The service wraps these with axum extractors and middleware.

pub mod auth;
pub mod types;

pub use auth::{issue_admin_token, sign_token, verify_token, AdminClaims, TokenError};
pub use types::{ApiResponse, ErrorBody, FieldError, PaginationMeta};
