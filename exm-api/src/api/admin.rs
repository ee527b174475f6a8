//! Admin endpoints
//!
//! Everything except `/admin/login` sits behind [`require_admin`].

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use exm_common::api::issue_admin_token;
use exm_common::api::types::ApiResponse;
use exm_common::models::{Artist, Release};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::catalog::{self, params, ArtistFilter, ListQuery, ReleaseFilter};
use crate::db::stats::{self, Analytics, Dashboard, Period};
use crate::db::{artists, releases};
use crate::error::{ApiError, ApiJson, ApiResult, ResultExt};
use crate::middleware::require_admin;
use crate::pagination::calculate_pagination;
use crate::uploads::{MAX_FILES, MAX_FILE_SIZE};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AdminUser,
}

/// POST /api/admin/login
///
/// Compares against the configured static credentials.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let username = body.get("username").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);

    let config = &state.config;
    if username != Some(config.admin_username.as_str())
        || password != Some(config.admin_password.as_str())
    {
        warn!("Failed admin login for {:?}", username);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = issue_admin_token(&config.admin_username, &state.signing_secret, Utc::now());
    info!("Admin {} logged in", config.admin_username);

    Ok(Json(
        ApiResponse::ok(LoginResponse {
            token,
            user: AdminUser {
                id: "admin".to_string(),
                username: config.admin_username.clone(),
                role: "admin".to_string(),
            },
        })
        .with_message("Login successful"),
    ))
}

/// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Dashboard>>> {
    let data = stats::dashboard(&state.db, Utc::now())
        .await
        .or_fail("Failed to fetch dashboard data")?;
    Ok(Json(ApiResponse::ok(data)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

/// GET /api/admin/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<ApiResponse<Analytics>>> {
    let data = stats::analytics(&state.db, Period::parse(query.period.as_deref()))
        .await
        .or_fail("Failed to fetch analytics")?;
    Ok(Json(ApiResponse::ok(data)))
}

/// GET /api/admin/artists (any status)
pub async fn list_artists(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Artist>>>> {
    const FAIL: &str = "Failed to fetch artists";
    let page = query.page_request(params::ADMIN_PAGE_SIZE);
    let sort = query.sort_spec(params::ADMIN_DEFAULT_SORT);

    let (mut items, total) =
        catalog::list_artists(&state.db, &ArtistFilter::admin(&query), &sort, page)
            .await
            .or_fail(FAIL)?;
    artists::attach_releases(&state.db, &mut items, Some(3), false)
        .await
        .or_fail(FAIL)?;

    Ok(Json(ApiResponse::paginated(items, calculate_pagination(total, page))))
}

/// GET /api/admin/releases (any status)
pub async fn list_releases(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Release>>>> {
    const FAIL: &str = "Failed to fetch releases";
    let page = query.page_request(params::ADMIN_PAGE_SIZE);
    let sort = query.sort_spec(params::ADMIN_DEFAULT_SORT);

    let (mut items, total) =
        catalog::list_releases(&state.db, &ReleaseFilter::admin(&query), &sort, page)
            .await
            .or_fail(FAIL)?;
    releases::attach_artists(&state.db, &mut items, false)
        .await
        .or_fail(FAIL)?;

    Ok(Json(ApiResponse::paginated(items, calculate_pagination(total, page))))
}

/// POST /api/admin/releases/:id/publish
pub async fn toggle_publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Release>>> {
    let release = releases::toggle_published(&state.db, &id)
        .await
        .or_fail("Failed to toggle release status")?
        .ok_or_else(|| ApiError::NotFound("Release not found".to_string()))?;

    let message = format!(
        "Release {} successfully",
        if release.published { "published" } else { "unpublished" }
    );
    Ok(Json(ApiResponse::ok(release).with_message(message)))
}

/// GET /api/admin/settings
pub async fn settings(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let store_connected = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    Json(ApiResponse::ok(json!({
        "siteName": "Excess Music",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "features": {
            "emailEnabled": state.config.email.is_configured(),
            "storeConnected": store_connected,
            "uploadsEnabled": true
        },
        "limits": {
            "maxFileSize": format!("{}MB", MAX_FILE_SIZE / (1024 * 1024)),
            "maxFilesPerUpload": MAX_FILES,
            "contactFormRateLimit": "3 per 15 minutes"
        }
    })))
}

pub fn admin_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/analytics", get(analytics))
        .route("/admin/artists", get(list_artists))
        .route("/admin/releases", get(list_releases))
        .route("/admin/releases/:id/publish", post(toggle_publish))
        .route("/admin/settings", get(settings))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/admin/login", post(login))
        .merge(protected)
}
