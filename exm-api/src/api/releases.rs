//! Release endpoints
//!
//! Public reads see published releases only; writes require an admin
//! token. Play events are public.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use exm_common::api::types::ApiResponse;
use exm_common::models::Release;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::artists::LimitQuery;
use crate::catalog::{self, params, ListQuery, ReleaseFilter};
use crate::db::{aggregate, releases};
use crate::error::{ApiError, ApiJson, ApiResult, ResultExt};
use crate::middleware::require_admin;
use crate::pagination::calculate_pagination;
use crate::validation::validate_release;
use crate::AppState;

const NOT_FOUND: &str = "Release not found";

/// GET /api/releases
pub async fn list_releases(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Release>>>> {
    const FAIL: &str = "Failed to fetch releases";
    let page = query.page_request(params::RELEASE_PAGE_SIZE);
    let sort = query.sort_spec(params::RELEASE_DEFAULT_SORT);

    let (mut items, total) =
        catalog::list_releases(&state.db, &ReleaseFilter::public(&query), &sort, page)
            .await
            .or_fail(FAIL)?;
    releases::attach_artists(&state.db, &mut items, false)
        .await
        .or_fail(FAIL)?;

    Ok(Json(ApiResponse::paginated(items, calculate_pagination(total, page))))
}

async fn curated(
    state: &AppState,
    filter: ReleaseFilter,
    sort: &str,
    limit: u32,
    fail: &str,
) -> ApiResult<Json<ApiResponse<Vec<Release>>>> {
    let mut items = catalog::curated_releases(&state.db, &filter, sort, limit)
        .await
        .or_fail(fail)?;
    releases::attach_artists(&state.db, &mut items, false)
        .await
        .or_fail(fail)?;
    Ok(Json(ApiResponse::ok(items)))
}

/// GET /api/releases/featured
pub async fn featured_releases(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Release>>>> {
    curated(
        &state,
        ReleaseFilter::featured(),
        "-releaseDate -totalPlays",
        query.limit(8),
        "Failed to fetch featured releases",
    )
    .await
}

/// GET /api/releases/latest
pub async fn latest_releases(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Release>>>> {
    curated(
        &state,
        ReleaseFilter::published(),
        "-releaseDate",
        query.limit(6),
        "Failed to fetch latest releases",
    )
    .await
}

/// GET /api/releases/:slug
pub async fn get_release(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ApiResponse<Release>>> {
    let release = releases::find_published_by_slug(&state.db, &slug)
        .await
        .or_fail("Failed to fetch release")?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::ok(release)))
}

/// POST /api/releases (admin)
pub async fn create_release(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Release>>)> {
    const FAIL: &str = "Failed to create release";
    let input = validate_release(&body).map_err(ApiError::Validation)?;
    let release = releases::insert(&state.db, input).await.or_fail(FAIL)?;

    let mut one = [release];
    releases::attach_artists(&state.db, &mut one, false)
        .await
        .or_fail(FAIL)?;
    let [release] = one;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(release).with_message("Release created successfully")),
    ))
}

/// PUT /api/releases/:id (admin)
pub async fn update_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ApiResponse<Release>>> {
    const FAIL: &str = "Failed to update release";
    let input = validate_release(&body).map_err(ApiError::Validation)?;
    let release = releases::update(&state.db, &id, input)
        .await
        .or_fail(FAIL)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let mut one = [release];
    releases::attach_artists(&state.db, &mut one, false)
        .await
        .or_fail(FAIL)?;
    let [release] = one;

    Ok(Json(ApiResponse::ok(release).with_message("Release updated successfully")))
}

/// DELETE /api/releases/:id (admin)
pub async fn delete_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = releases::delete(&state.db, &id)
        .await
        .or_fail("Failed to delete release")?;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    Ok(Json(ApiResponse::message("Release deleted successfully")))
}

/// POST /api/releases/:id/toggle-featured (admin)
pub async fn toggle_featured(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Release>>> {
    let release = releases::toggle_featured(&state.db, &id)
        .await
        .or_fail("Failed to toggle featured status")?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let message = format!(
        "Release {} successfully",
        if release.featured { "featured" } else { "unfeatured" }
    );
    Ok(Json(ApiResponse::ok(release).with_message(message)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub track_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayCount {
    pub plays: i64,
}

/// POST /api/releases/:id/play
///
/// Body is optional: `{}` or no body counts a release-level play.
pub async fn record_play(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<PlayCount>>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PlayRequest::default()
    } else {
        serde_json::from_slice::<PlayRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?
    };
    let track_id = request.track_id.as_deref().filter(|t| !t.is_empty());

    let outcome = aggregate::record_play(&state.db, &id, track_id)
        .await
        .or_fail("Failed to update play count")?;

    Ok(Json(ApiResponse::ok(PlayCount {
        plays: outcome.plays,
    })))
}

pub fn release_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/releases", post(create_release))
        .route("/releases/:id", put(update_release).delete(delete_release))
        .route("/releases/:id/toggle-featured", post(toggle_featured))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/releases", get(list_releases))
        .route("/releases/featured", get(featured_releases))
        .route("/releases/latest", get(latest_releases))
        // Matched as a slug for GET
        .route("/releases/:id", get(get_release))
        .route("/releases/:id/play", post(record_play))
        .merge(admin)
}
