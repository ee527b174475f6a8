//! Admin authentication middleware
//!
//! Requests carry `Authorization: Bearer <token>`; a verified admin token
//! puts its [`AdminClaims`] into the request extensions for handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use exm_common::api::{verify_token, AdminClaims};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject requests without a valid admin token
///
/// Missing token: 401, unless no signing secret is configured and the
/// service runs in development, in which case the request proceeds as
/// `dev-admin`. Bad signature, expiry or malformed token: 401. Valid token
/// without the admin role: 403.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = match bearer_token(&request) {
        Some(token) => verify_token(token, &state.signing_secret, Utc::now()).map_err(|e| {
            debug!("Rejected admin token: {}", e);
            ApiError::Unauthorized("Invalid admin token.".to_string())
        })?,
        None if state.dev_admin_fallback() => {
            warn!(
                "No admin token on {} {}; granting dev-admin (no signing secret configured)",
                request.method(),
                request.uri().path()
            );
            AdminClaims::dev_admin()
        }
        None => {
            return Err(ApiError::Unauthorized(
                "Access denied. Admin token required.".to_string(),
            ))
        }
    };

    if !claims.is_admin() {
        return Err(ApiError::Forbidden(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
