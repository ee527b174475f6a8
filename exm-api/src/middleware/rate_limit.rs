//! Per-client rate limiting
//!
//! Keyed GCRA limiters: the whole API allows 100 requests per 15 minutes
//! per client, the contact form 3 submissions per 15 minutes. A client is
//! identified by its socket address, falling back to the first
//! `X-Forwarded-For` entry.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

const WINDOW: Duration = Duration::from_secs(15 * 60);
const API_MAX: u32 = 100;
const CONTACT_MAX: u32 = 3;

/// `max` requests per `window`, all available as an initial burst
fn quota(max: u32, window: Duration) -> Quota {
    let burst = NonZeroU32::new(max).unwrap_or(NonZeroU32::MIN);
    Quota::with_period(window / burst.get())
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

/// Limiters shared by all requests
pub struct RateLimits {
    api: DefaultKeyedRateLimiter<String>,
    contact: DefaultKeyedRateLimiter<String>,
}

impl Default for RateLimits {
    fn default() -> Self {
        RateLimits::new(API_MAX, CONTACT_MAX)
    }
}

impl RateLimits {
    pub fn new(api_max: u32, contact_max: u32) -> Self {
        RateLimits {
            api: RateLimiter::keyed(quota(api_max, WINDOW)),
            contact: RateLimiter::keyed(quota(contact_max, WINDOW)),
        }
    }

    pub fn check_api(&self, client: &str) -> bool {
        self.api.check_key(&client.to_string()).is_ok()
    }

    pub fn check_contact(&self, client: &str) -> bool {
        self.contact.check_key(&client.to_string()).is_ok()
    }

    /// Drop state for clients whose quota has fully replenished
    pub fn retain_recent(&self) {
        self.api.retain_recent();
        self.contact.retain_recent();
        debug!(
            "Rate limiter keys: api={}, contact={}",
            self.api.len(),
            self.contact.len()
        );
    }
}

/// Identify the calling client
pub fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request);
    if !state.limits.check_api(&client) {
        warn!("API rate limit exceeded for {}", client);
        return Err(ApiError::TooManyRequests(
            "Too many requests from this IP, please try again later.".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

pub async fn limit_contact(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request);
    if !state.limits.check_contact(&client) {
        warn!("Contact rate limit exceeded for {}", client);
        return Err(ApiError::TooManyRequests(
            "Too many contact form submissions. Please try again later.".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_burst_then_reject() {
        let limits = RateLimits::new(100, 3);
        for _ in 0..3 {
            assert!(limits.check_contact("10.0.0.1"));
        }
        assert!(!limits.check_contact("10.0.0.1"));
        assert!(limits.check_contact("10.0.0.2"));
    }

    #[test]
    fn test_api_allows_full_window() {
        let limits = RateLimits::default();
        for _ in 0..API_MAX {
            assert!(limits.check_api("client"));
        }
        assert!(!limits.check_api("client"));
    }

    #[test]
    fn test_client_key_sources() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.9");

        let mut req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), "unknown");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 5], 4000))));
        assert_eq!(client_key(&req), "192.168.1.5");
    }
}
