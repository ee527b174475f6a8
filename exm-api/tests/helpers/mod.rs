//! Shared fixtures for exm-api integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use exm_api::db::{artists, releases};
use exm_api::mail::MailTransport;
use exm_api::validation::{validate_artist, validate_release};
use exm_api::{build_router, AppState};
use exm_common::api::issue_admin_token;
use exm_common::config::{Config, ConfigLayer, Environment};
use exm_common::db::init_in_memory;
use exm_common::models::{Artist, Release};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router plus the state behind it; the temp dir holds uploads and static files
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub pool: SqlitePool,
    pub dir: TempDir,
}

impl TestApp {
    pub fn token(&self) -> String {
        issue_admin_token(&self.state.config.admin_username, TEST_SECRET, Utc::now())
    }

    /// Send a request and decode the JSON body (`Null` for empty bodies)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request("GET", uri, None, None)).await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.token();
        self.send(request(method, uri, body, Some(&token))).await
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    Config::resolve(ConfigLayer {
        database_path: Some(":memory:".to_string()),
        environment: Some(Environment::Development),
        jwt_secret: Some(TEST_SECRET.to_string()),
        upload_root: Some(dir.path().join("uploads")),
        static_root: Some(dir.path().join("public")),
        ..Default::default()
    })
}

pub async fn setup_with(configure: impl FnOnce(AppState) -> AppState) -> TestApp {
    let dir = TempDir::new().unwrap();
    let pool = init_in_memory().await.unwrap();
    let state = configure(AppState::new(pool.clone(), test_config(&dir)));
    state.uploads.ensure_dirs().unwrap();
    TestApp {
        app: build_router(state.clone()),
        state,
        pool,
        dir,
    }
}

pub async fn setup() -> TestApp {
    setup_with(|state| state).await
}

pub async fn setup_with_mailer(mailer: Arc<dyn MailTransport>) -> TestApp {
    setup_with(|state| state.with_mailer(mailer)).await
}

pub fn request(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// ========================================
// Catalog fixtures
// ========================================

pub async fn seed_artist(pool: &SqlitePool, body: Value) -> Artist {
    artists::insert(pool, validate_artist(&body).unwrap()).await.unwrap()
}

pub fn release_body(artist: &Artist, title: &str, catalog_number: &str) -> Value {
    json!({
        "title": title,
        "artist": artist.id.to_string(),
        "releaseType": "single",
        "genre": ["techno"],
        "artwork": "/uploads/artwork/cover.png",
        "tracks": [
            {"title": "Opening", "duration": "4:10", "audioFile": "/uploads/audio/a.mp3", "trackNumber": 1},
            {"title": "Closing", "duration": "5:02", "audioFile": "/uploads/audio/b.mp3", "trackNumber": 2}
        ],
        "releaseDate": "2024-03-01",
        "catalogNumber": catalog_number,
        "published": true
    })
}

pub async fn seed_release(pool: &SqlitePool, body: Value) -> Release {
    releases::insert(pool, validate_release(&body).unwrap()).await.unwrap()
}
