//! Artist endpoints
//!
//! Public reads see active artists only; writes require an admin token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use exm_common::api::types::ApiResponse;
use exm_common::models::Artist;
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::{self, params, ArtistFilter, ListQuery};
use crate::db::artists::{self, ArtistRemoval};
use crate::error::{ApiError, ApiJson, ApiResult, ResultExt};
use crate::middleware::require_admin;
use crate::pagination::{calculate_pagination, PageRequest};
use crate::validation::validate_artist;
use crate::AppState;

const NOT_FOUND: &str = "Artist not found";

/// `?limit=` of curated lists
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    pub fn limit(&self, default: u32) -> u32 {
        PageRequest::from_query(None, self.limit.as_deref(), default).limit
    }
}

/// GET /api/artists
pub async fn list_artists(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Artist>>>> {
    const FAIL: &str = "Failed to fetch artists";
    let page = query.page_request(params::ARTIST_PAGE_SIZE);
    let sort = query.sort_spec(params::ARTIST_DEFAULT_SORT);

    let (mut items, total) =
        catalog::list_artists(&state.db, &ArtistFilter::public(&query), &sort, page)
            .await
            .or_fail(FAIL)?;
    artists::attach_releases(&state.db, &mut items, Some(5), true)
        .await
        .or_fail(FAIL)?;

    Ok(Json(ApiResponse::paginated(items, calculate_pagination(total, page))))
}

/// GET /api/artists/featured
pub async fn featured_artists(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Artist>>>> {
    const FAIL: &str = "Failed to fetch featured artists";
    let mut items = catalog::curated_artists(
        &state.db,
        &ArtistFilter::featured(),
        "-totalPlays -createdAt",
        query.limit(6),
    )
    .await
    .or_fail(FAIL)?;
    artists::attach_releases(&state.db, &mut items, Some(3), true)
        .await
        .or_fail(FAIL)?;

    Ok(Json(ApiResponse::ok(items)))
}

/// GET /api/artists/:slug
pub async fn get_artist(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ApiResponse<Artist>>> {
    const FAIL: &str = "Failed to fetch artist";
    let artist = artists::find_active_by_slug(&state.db, &slug)
        .await
        .or_fail(FAIL)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let mut one = [artist];
    artists::attach_releases(&state.db, &mut one, None, true)
        .await
        .or_fail(FAIL)?;
    let [artist] = one;

    Ok(Json(ApiResponse::ok(artist)))
}

/// POST /api/artists (admin)
pub async fn create_artist(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Artist>>)> {
    let input = validate_artist(&body).map_err(ApiError::Validation)?;
    let artist = artists::insert(&state.db, input)
        .await
        .or_fail("Failed to create artist")?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(artist).with_message("Artist created successfully")),
    ))
}

/// PUT /api/artists/:id (admin)
pub async fn update_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ApiResponse<Artist>>> {
    let input = validate_artist(&body).map_err(ApiError::Validation)?;
    let artist = artists::update(&state.db, &id, input)
        .await
        .or_fail("Failed to update artist")?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::ok(artist).with_message("Artist updated successfully")))
}

/// DELETE /api/artists/:id (admin)
///
/// Artists still referenced by releases are deactivated instead.
pub async fn delete_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let removal = artists::delete(&state.db, &id)
        .await
        .or_fail("Failed to delete artist")?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let message = match removal {
        ArtistRemoval::Deactivated => "Artist deactivated (has releases)",
        ArtistRemoval::Deleted => "Artist deleted successfully",
    };
    Ok(Json(ApiResponse::message(message)))
}

/// POST /api/artists/:id/toggle-featured (admin)
pub async fn toggle_featured(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Artist>>> {
    let artist = artists::toggle_featured(&state.db, &id)
        .await
        .or_fail("Failed to toggle featured status")?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let message = format!(
        "Artist {} successfully",
        if artist.featured { "featured" } else { "unfeatured" }
    );
    Ok(Json(ApiResponse::ok(artist).with_message(message)))
}

pub fn artist_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/artists", post(create_artist))
        .route("/artists/:id", put(update_artist).delete(delete_artist))
        .route("/artists/:id/toggle-featured", post(toggle_featured))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/artists", get(list_artists))
        .route("/artists/featured", get(featured_artists))
        // Same parameter name as the admin routes; matched as a slug here
        .route("/artists/:id", get(get_artist))
        .merge(admin)
}
