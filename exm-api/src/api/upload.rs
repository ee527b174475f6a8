//! Media upload endpoints (admin)
//!
//! Multipart bodies are read field by field. Every file is checked against
//! its field's allow-list, then streamed to disk under the size cap; if any
//! part of a request is rejected, files already written for it are removed.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use exm_common::api::types::ApiResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::middleware::require_admin;
use crate::uploads::{
    FileListing, Partition, PendingFile, StoredFile, UploadError, UploadStore, MAX_FILES,
    MAX_FILE_SIZE,
};
use crate::AppState;

/// Request body cap on upload routes: a full batch plus multipart overhead
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILES * MAX_FILE_SIZE + 1024 * 1024;

fn upload_error(err: UploadError, context: &str) -> ApiError {
    if err.is_client_error() {
        ApiError::Upload(err.to_string())
    } else {
        ApiError::internal(context, err)
    }
}

fn multipart_rejection(rejection: MultipartRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

// ========================================
// Multipart intake
// ========================================

/// File fields a route accepts and how many of each
type FieldRules = [(&'static str, usize)];

/// A stored file with the field it arrived in
type Received = (&'static str, StoredFile);

async fn read_files(
    store: &UploadStore,
    multipart: &mut Multipart,
    rules: &FieldRules,
) -> ApiResult<Vec<Received>> {
    let mut received = Vec::new();
    match read_files_into(store, multipart, rules, &mut received).await {
        Ok(()) => Ok(received),
        Err(e) => {
            if !received.is_empty() {
                warn!("Upload rejected; removing {} partial file(s)", received.len());
                let partial: Vec<StoredFile> = received.into_iter().map(|(_, f)| f).collect();
                store.discard(&partial).await;
            }
            Err(e)
        }
    }
}

async fn read_files_into(
    store: &UploadStore,
    multipart: &mut Multipart,
    rules: &FieldRules,
    received: &mut Vec<Received>,
) -> ApiResult<()> {
    let mut counts = vec![0usize; rules.len()];

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Rejection(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        // Plain text parts are ignored
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let Some(slot) = rules.iter().position(|(allowed, _)| *allowed == name) else {
            return Err(upload_error(UploadError::UnexpectedField(name), "Upload failed"));
        };
        if received.len() >= MAX_FILES {
            return Err(upload_error(UploadError::TooMany, "Upload failed"));
        }
        counts[slot] += 1;
        if counts[slot] > rules[slot].1 {
            return Err(upload_error(UploadError::UnexpectedField(name), "Upload failed"));
        }

        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let partition =
            Partition::classify(&name, &mimetype).map_err(|e| upload_error(e, "Upload failed"))?;

        let mut pending = store
            .begin(partition, &original_name, &mimetype)
            .await
            .map_err(|e| upload_error(e, "Upload failed"))?;
        if let Err(e) = copy_field(&mut field, &mut pending).await {
            pending.abandon().await;
            return Err(e);
        }
        let file = pending
            .finish()
            .await
            .map_err(|e| upload_error(e, "Upload failed"))?;
        received.push((rules[slot].0, file));
    }
    Ok(())
}

/// Stream one field's body into its file
async fn copy_field(field: &mut Field<'_>, pending: &mut PendingFile) -> ApiResult<()> {
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::Rejection(e.status(), e.body_text()))?
    {
        pending
            .write(&chunk)
            .await
            .map_err(|e| upload_error(e, "Upload failed"))?;
    }
    Ok(())
}

fn files_only(received: Vec<Received>) -> Vec<StoredFile> {
    received.into_iter().map(|(_, file)| file).collect()
}

// ========================================
// Handlers
// ========================================

/// POST /api/upload/audio (up to 10 `audio` files)
pub async fn upload_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ApiResponse<Vec<StoredFile>>>> {
    let mut multipart = multipart.map_err(multipart_rejection)?;
    let received = read_files(&state.uploads, &mut multipart, &[("audio", MAX_FILES)]).await?;
    let files = files_only(received);
    if files.is_empty() {
        return Err(ApiError::BadRequest("No audio files uploaded".to_string()));
    }

    info!("Uploaded {} audio file(s)", files.len());
    let message = format!("Successfully uploaded {} audio file(s)", files.len());
    Ok(Json(ApiResponse::ok(files).with_message(message)))
}

/// POST /api/upload/artwork (single `artwork` image)
pub async fn upload_artwork(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ApiResponse<StoredFile>>> {
    let mut multipart = multipart.map_err(multipart_rejection)?;
    let received = read_files(&state.uploads, &mut multipart, &[("artwork", 1)]).await?;
    let file = files_only(received)
        .pop()
        .ok_or_else(|| ApiError::BadRequest("No artwork file uploaded".to_string()))?;

    Ok(Json(ApiResponse::ok(file).with_message("Artwork uploaded successfully")))
}

/// POST /api/upload/profile (single `profileImage`)
pub async fn upload_profile(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ApiResponse<StoredFile>>> {
    let mut multipart = multipart.map_err(multipart_rejection)?;
    let received = read_files(&state.uploads, &mut multipart, &[("profileImage", 1)]).await?;
    let file = files_only(received)
        .pop()
        .ok_or_else(|| ApiError::BadRequest("No profile image uploaded".to_string()))?;

    Ok(Json(ApiResponse::ok(file).with_message("Profile image uploaded successfully")))
}

/// Files of a mixed upload, grouped by field
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleUpload {
    pub audio: Vec<StoredFile>,
    pub artwork: Option<StoredFile>,
    pub profile_image: Option<StoredFile>,
}

/// POST /api/upload/multiple (audio <= 10, artwork <= 1, profileImage <= 1)
pub async fn upload_multiple(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ApiResponse<MultipleUpload>>> {
    let mut multipart = multipart.map_err(multipart_rejection)?;
    let rules = [("audio", MAX_FILES), ("artwork", 1), ("profileImage", 1)];
    let received = read_files(&state.uploads, &mut multipart, &rules).await?;

    let mut result = MultipleUpload::default();
    for (field, file) in received {
        match field {
            "audio" => result.audio.push(file),
            "artwork" => result.artwork = Some(file),
            _ => result.profile_image = Some(file),
        }
    }

    Ok(Json(ApiResponse::ok(result).with_message("Files uploaded successfully")))
}

/// DELETE /api/upload/:filename
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = state
        .uploads
        .delete(&filename)
        .await
        .map_err(|e| upload_error(e, "Failed to delete file"))?;
    if !deleted {
        return Err(ApiError::NotFound("File not found".to_string()));
    }
    Ok(Json(ApiResponse::message("File deleted successfully")))
}

#[derive(Debug, Default, Deserialize)]
pub struct FilesQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/upload/files?type=all|audio|images|artwork
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> ApiResult<Json<ApiResponse<FileListing>>> {
    let listing = state
        .uploads
        .list(Partition::from_type_param(query.kind.as_deref()))
        .await
        .map_err(|e| ApiError::internal("Failed to list files", e))?;
    Ok(Json(ApiResponse::ok(listing)))
}

pub fn upload_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/upload/audio", post(upload_audio))
        .route("/upload/artwork", post(upload_artwork))
        .route("/upload/profile", post(upload_profile))
        .route("/upload/multiple", post(upload_multiple))
        .route("/upload/files", get(list_files))
        .route("/upload/:filename", delete(delete_file))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route_layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
