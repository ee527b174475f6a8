//! Error types for exm-api
//!
//! Every error renders as the standard envelope
//! `{success: false, error, message?, details?}`. Server-side failures carry
//! a generic per-operation `error` text; the underlying detail is logged and
//! attached as a response extension so the development-only
//! [`expose_error_detail`] layer can surface it as `message`.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use exm_common::api::types::{ErrorBody, FieldError};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use crate::AppState;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed validation (400, all field errors)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Natural key already taken (400)
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Rate limit exceeded (429)
    #[error("{0}")]
    TooManyRequests(String),

    /// Rejected upload (400)
    #[error("{0}")]
    Upload(String),

    /// Extractor rejection with its own status (413 body too large etc.)
    #[error("{1}")]
    Rejection(StatusCode, String),

    /// Outbound delivery failed (500); the transport error is logged, not returned
    #[error("{0}")]
    Delivery(String),

    /// Server-side failure (500); `detail` never reaches production clients
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::BadRequest(_)
            | ApiError::Conflict(_)
            | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Rejection(status, _) => *status,
            ApiError::Delivery(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Detail of a 500 response, kept out of the body
#[derive(Debug, Clone)]
pub struct InternalErrorDetail {
    pub message: String,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(details) => {
                let body = ErrorBody::new("Validation failed").with_details(details);
                (status, Json(body)).into_response()
            }
            ApiError::Internal { message, detail } => {
                error!("{}: {}", message, detail);
                let mut response = (status, Json(ErrorBody::new(message.clone()))).into_response();
                response
                    .extensions_mut()
                    .insert(InternalErrorDetail { message, detail });
                response
            }
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Upload(msg)
            | ApiError::Delivery(msg)
            | ApiError::Rejection(_, msg) => (status, Json(ErrorBody::new(msg))).into_response(),
        }
    }
}

/// Development-only layer: re-render 500 bodies with the error detail
pub async fn expose_error_detail(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.environment.is_development() {
        return response;
    }
    match response.extensions().get::<InternalErrorDetail>().cloned() {
        Some(info) => {
            let body = ErrorBody::new(info.message).with_message(info.detail);
            (response.status(), Json(body)).into_response()
        }
        None => response,
    }
}

// ========================================
// Library error mapping
// ========================================

/// Attach a per-operation message to library errors
pub trait ResultExt<T> {
    /// Client-caused errors keep their own message; everything else becomes
    /// a 500 whose public text is `message`
    fn or_fail(self, message: &str) -> ApiResult<T>;
}

impl<T> ResultExt<T> for exm_common::Result<T> {
    fn or_fail(self, message: &str) -> ApiResult<T> {
        self.map_err(|e| match e {
            exm_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            exm_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            exm_common::Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::internal(message, other),
        })
    }
}

// ========================================
// JSON extractor
// ========================================

/// `Json<T>` whose rejections render as the error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection.status() {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
        }
        status => ApiError::Rejection(status, rejection.body_text()),
    }
}
