//! exm-api library - Excess Music catalog service
//!
//! HTTP service for the label catalog: public artist and release browsing,
//! admin content management, play counting, the contact form and media
//! uploads. The frontend is served as static files.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    Json, Router,
};
use exm_common::api::auth::generate_secret;
use exm_common::api::types::ErrorBody;
use exm_common::config::Config;
use sqlx::SqlitePool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod api;
pub mod catalog;
pub mod cli;
pub mod db;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod pagination;
pub mod uploads;
pub mod validation;

use mail::{MailTransport, SmtpMailer};
use middleware::RateLimits;
use uploads::UploadStore;

/// JSON body cap outside the upload routes
pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    style-src 'self' 'unsafe-inline' https://unpkg.com; \
    script-src 'self' 'unsafe-inline' https://unpkg.com; \
    img-src 'self' data: https: blob:; \
    connect-src 'self' https://unpkg.com; \
    font-src 'self' https://unpkg.com; \
    object-src 'none'; \
    media-src 'self' blob:; \
    frame-src 'none'";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalog store
    pub db: SqlitePool,
    pub config: Arc<Config>,
    /// Admin token signing secret (configured, or generated per process)
    pub signing_secret: String,
    /// False when the secret was generated at startup
    pub secret_configured: bool,
    /// Outgoing mail; `None` when SMTP credentials are absent
    pub mailer: Option<Arc<dyn MailTransport>>,
    pub uploads: Arc<UploadStore>,
    pub limits: Arc<RateLimits>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let (signing_secret, secret_configured) = match config.jwt_secret.clone() {
            Some(secret) => (secret, true),
            None => {
                info!("No signing secret configured; generated a per-process secret");
                (generate_secret(), false)
            }
        };

        let mailer: Option<Arc<dyn MailTransport>> = if config.email.is_configured() {
            match SmtpMailer::from_config(&config.email) {
                Ok(mailer) => Some(Arc::new(mailer)),
                Err(e) => {
                    warn!("Email disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let uploads = Arc::new(UploadStore::new(config.upload_root.clone()));

        Self {
            db,
            config: Arc::new(config),
            signing_secret,
            secret_configured,
            mailer,
            uploads,
            limits: Arc::new(RateLimits::default()),
        }
    }

    /// Replace the mail transport
    pub fn with_mailer(mut self, mailer: Arc<dyn MailTransport>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Replace the rate limiter quotas
    pub fn with_limits(mut self, limits: RateLimits) -> Self {
        self.limits = Arc::new(limits);
        self
    }

    /// Unauthenticated admin requests pass as `dev-admin`
    ///
    /// Only in development, and only while no signing secret is configured.
    pub fn dev_admin_fallback(&self) -> bool {
        !self.secret_configured && self.config.environment.is_development()
    }
}

async fn api_not_found() -> impl IntoResponse {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(ErrorBody::new("API endpoint not found")),
    )
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn security_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
}

/// Build application router
///
/// `/api/*` carries the JSON API behind the per-client rate limit;
/// `/uploads/*` serves stored media; everything else is the static
/// frontend with `index.html` as the fallback page.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(api::health_routes())
        .merge(api::artist_routes(state.clone()))
        .merge(api::release_routes(state.clone()))
        .merge(api::contact_routes(state.clone()))
        .merge(api::admin_routes(state.clone()))
        .merge(api::upload_routes(state.clone()))
        .fallback(api_not_found)
        .layer(from_fn_with_state(state.clone(), error::expose_error_detail))
        .layer(from_fn_with_state(state.clone(), middleware::limit_api));

    let static_root = state.config.static_root.clone();
    let index = static_root.join("index.html");
    let pages = Router::new()
        .route_service("/", ServeFile::new(&index))
        .route_service("/artists", ServeFile::new(static_root.join("artists.html")))
        .route_service("/contact", ServeFile::new(static_root.join("contact.html")))
        .route_service("/ngo", ServeFile::new(static_root.join("ngo.html")));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .merge(pages)
        .fallback_service(ServeDir::new(&static_root).fallback(ServeFile::new(&index)))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(security_header(header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY))
        .layer(security_header(header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .layer(security_header(header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .layer(security_header(header::REFERRER_POLICY, "no-referrer"))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
