//! Shared API request/response types
//!
//! Every JSON response uses the same envelope:
//! `{ success, data?, error?, message?, pagination?, details? }`

use serde::{Deserialize, Serialize};

// ========================================
// Envelope
// ========================================

/// Successful response envelope
///
/// # Examples
///
/// ```
/// use exm_common::api::types::ApiResponse;
///
/// let body = serde_json::to_value(ApiResponse::ok(vec![1, 2, 3])).unwrap();
/// assert_eq!(body["success"], true);
/// assert!(body.get("pagination").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: PaginationMeta) -> Self {
        ApiResponse {
            pagination: Some(pagination),
            ..ApiResponse::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success with a message and no data
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }
    }
}

/// Page-based pagination block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub limit: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

// ========================================
// Error Response Types
// ========================================

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (`tracks.0.title`)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error envelope
///
/// # Examples
///
/// ```
/// use exm_common::api::types::ErrorBody;
///
/// let body = serde_json::to_value(ErrorBody::new("Artist not found")).unwrap();
/// assert_eq!(body["success"], false);
/// assert_eq!(body["error"], "Artist not found");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            success: false,
            error: error.into(),
            message: None,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
