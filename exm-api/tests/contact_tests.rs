//! Integration tests for the contact form
//!
//! Tests cover:
//! - Validation of submissions
//! - Delivery through a mail transport (notification + auto-reply)
//! - Acknowledgement when no transport is configured
//! - Transport failures and the per-client submission limit

mod helpers;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use exm_api::mail::{MailError, MailTransport, OutgoingMail};
use helpers::*;
use serde_json::{json, Value};

/// Keeps every message instead of sending it
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl MailTransport for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
        Err(MailError::NotConfigured("relay refused connection".to_string()))
    }
}

fn submission() -> Value {
    json!({
        "name": "  Jo Listener ",
        "email": "jo@example.com",
        "subject": "Demo submission",
        "message": "Hello <team>,\nplease hear my demo.",
        "type": "demo"
    })
}

async fn post_contact(t: &TestApp, body: Value) -> (StatusCode, Value) {
    t.send(request("POST", "/api/contact", Some(body), None)).await
}

#[tokio::test]
async fn test_contact_info() {
    let t = setup().await;
    let (status, body) = t.get("/api/contact/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "contact@excessmusic.com");
    assert_eq!(body["data"]["responseTime"], "24-48 hours");
}

#[tokio::test]
async fn test_short_message_rejected() {
    let t = setup().await;
    let mut body = submission();
    body["message"] = json!("too short");

    let (status, body) = post_contact(&t, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "message");
}

#[tokio::test]
async fn test_unknown_type_rejected() {
    let t = setup().await;
    let mut body = submission();
    body["type"] = json!("complaint");

    let (status, body) = post_contact(&t, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "type");
}

#[tokio::test]
async fn test_without_transport_submission_is_acknowledged() {
    let t = setup().await;
    assert!(t.state.mailer.is_none());

    let (status, body) = post_contact(&t, submission()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Message received! We'll get back to you soon.");
}

#[tokio::test]
async fn test_delivery_sends_notification_and_auto_reply() {
    let mailer = Arc::new(RecordingMailer::default());
    let t = setup_with_mailer(mailer.clone()).await;

    let (status, body) = post_contact(&t, submission()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Message sent successfully! We'll get back to you soon."
    );

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);

    let notification = &sent[0];
    assert_eq!(notification.to, "contact@excessmusic.com");
    assert_eq!(notification.reply_to.as_deref(), Some("jo@example.com"));
    assert_eq!(notification.subject, "[Excess Music] Demo submission");
    assert!(notification.text.contains("Jo Listener"));
    assert!(notification.html.contains("&lt;team&gt;"));
    assert!(!notification.html.contains("<team>"));

    let reply = &sent[1];
    assert_eq!(reply.to, "jo@example.com");
}

#[tokio::test]
async fn test_transport_failure_hides_detail() {
    let t = setup_with_mailer(Arc::new(FailingMailer)).await;

    let (status, body) = post_contact(&t, submission()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to send message. Please try again later.");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_fourth_submission_is_rate_limited() {
    let t = setup().await;
    for _ in 0..3 {
        let (status, _) = post_contact(&t, submission()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_contact(&t, submission()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Too many"));
}
