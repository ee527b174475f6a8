//! Contact form endpoints

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use exm_common::api::types::ApiResponse;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::mail::{auto_reply_mail, notification_mail};
use crate::middleware::limit_contact;
use crate::validation::validate_contact;
use crate::AppState;

/// Label address used when no sender or recipient is configured
pub const LABEL_ADDRESS: &str = "contact@excessmusic.com";

const SEND_FAILED: &str = "Failed to send message. Please try again later.";

/// POST /api/contact
///
/// With a mail transport: notify the label and auto-reply to the sender.
/// Without one: log the submission and acknowledge it.
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let contact = validate_contact(&body).map_err(ApiError::Validation)?;

    let Some(mailer) = state.mailer.clone() else {
        info!(
            name = %contact.name,
            email = %contact.email,
            subject = %contact.subject,
            kind = contact.kind.as_str(),
            message = %contact.message,
            "Contact form submission (email not configured)"
        );
        return Ok(Json(ApiResponse::message(
            "Message received! We'll get back to you soon.",
        )));
    };

    let email = &state.config.email;
    let from = email.sender().unwrap_or(LABEL_ADDRESS);
    let to = email.recipient().unwrap_or(LABEL_ADDRESS);

    let sent = async {
        mailer.send(notification_mail(&contact, from, to)).await?;
        mailer.send(auto_reply_mail(&contact, from)).await
    }
    .await;

    match sent {
        Ok(()) => {
            info!("Contact form from {} delivered", contact.email);
            Ok(Json(ApiResponse::message(
                "Message sent successfully! We'll get back to you soon.",
            )))
        }
        Err(e) => {
            // Transport detail stays in the log only
            error!("Error sending contact form: {}", e);
            Err(ApiError::Delivery(SEND_FAILED.to_string()))
        }
    }
}

/// GET /api/contact/info
pub async fn contact_info() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({
        "email": LABEL_ADDRESS,
        "social": {
            "instagram": "https://instagram.com/excessmusic",
            "twitter": "https://twitter.com/excessmusic",
            "soundcloud": "https://soundcloud.com/excessmusic"
        },
        "address": {
            "city": "Your City",
            "country": "Your Country"
        },
        "businessHours": "Monday - Friday, 9AM - 6PM",
        "responseTime": "24-48 hours"
    })))
}

pub fn contact_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/contact",
            post(submit_contact).route_layer(middleware::from_fn_with_state(state, limit_contact)),
        )
        .route("/contact/info", get(contact_info))
}
