//! Integration tests for admin content writes and play counting
//!
//! Tests cover:
//! - Admin token enforcement on write routes
//! - Artist create / update / delete / toggle-featured
//! - Release create / update / delete, slug suffixes, counters
//! - Play events on tracks and releases

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::json;

// =============================================================================
// Admin gate
// =============================================================================

#[tokio::test]
async fn test_write_without_token_rejected() {
    let t = setup().await;
    let (status, body) = t
        .send(request("POST", "/api/artists", Some(json!({"name": "Nobody"})), None))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access denied. Admin token required.");
}

#[tokio::test]
async fn test_write_with_bad_token_rejected() {
    let t = setup().await;
    let (status, body) = t
        .send(request(
            "POST",
            "/api/artists",
            Some(json!({"name": "Nobody"})),
            Some("not-a-token"),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid admin token.");
}

#[tokio::test]
async fn test_dev_fallback_only_without_secret() {
    let t = setup_with(|mut state| {
        state.secret_configured = false;
        state
    })
    .await;
    assert!(t.state.dev_admin_fallback());

    let (status, body) = t
        .send(request("POST", "/api/artists", Some(json!({"name": "Walk In"})), None))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "walk-in");
}

// =============================================================================
// Artists
// =============================================================================

#[tokio::test]
async fn test_create_artist_and_slug_conflict() {
    let t = setup().await;

    let (status, body) = t
        .admin("POST", "/api/artists", Some(json!({"name": "Test Artist", "genre": ["techno"]})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Artist created successfully");
    assert_eq!(body["data"]["slug"], "test-artist");
    assert_eq!(body["data"]["active"], true);
    assert_eq!(body["data"]["totalReleases"], 0);

    let (status, body) = t
        .admin("POST", "/api/artists", Some(json!({"name": "Test Artist!!"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Artist with this name already exists");
}

#[tokio::test]
async fn test_create_artist_validation_lists_every_field() {
    let t = setup().await;
    let (status, body) = t
        .admin(
            "POST",
            "/api/artists",
            Some(json!({
                "genre": ["polka"],
                "socialLinks": {"instagram": "https://example.com/me"}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.iter().any(|f| f.starts_with("genre")));
    assert!(fields.iter().any(|f| f.contains("instagram")));
}

#[tokio::test]
async fn test_update_artist_reslugs_and_clears_bio() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Old Name", "bio": "Something"})).await;

    let (status, body) = t
        .admin(
            "PUT",
            &format!("/api/artists/{}", artist.id),
            Some(json!({"name": "New Name", "bio": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "new-name");
    assert!(body["data"]["bio"].is_null());

    let (status, _) = t
        .admin("PUT", "/api/artists/does-not-exist", Some(json!({"name": "X"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_artist_soft_when_releases_exist() {
    let t = setup().await;
    let busy = seed_artist(&t.pool, json!({"name": "Busy"})).await;
    let idle = seed_artist(&t.pool, json!({"name": "Idle"})).await;
    seed_release(&t.pool, release_body(&busy, "Work", "EXM001")).await;

    let (status, body) = t.admin("DELETE", &format!("/api/artists/{}", busy.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Artist deactivated (has releases)");
    let (status, _) = t.get("/api/artists/busy").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t.admin("DELETE", &format!("/api/artists/{}", idle.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Artist deleted successfully");

    let (status, body) = t.admin("DELETE", &format!("/api/artists/{}", idle.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Artist not found");
}

#[tokio::test]
async fn test_toggle_artist_featured() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Flip"})).await;
    let uri = format!("/api/artists/{}/toggle-featured", artist.id);

    let (_, body) = t.admin("POST", &uri, None).await;
    assert_eq!(body["data"]["featured"], true);
    assert_eq!(body["message"], "Artist featured successfully");

    let (_, body) = t.admin("POST", &uri, None).await;
    assert_eq!(body["data"]["featured"], false);
    assert_eq!(body["message"], "Artist unfeatured successfully");
}

// =============================================================================
// Releases
// =============================================================================

#[tokio::test]
async fn test_create_release_suffixes_duplicate_slug() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Test Artist"})).await;

    let (status, body) = t
        .admin("POST", "/api/releases", Some(release_body(&artist, "Night", "exm001")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "test-artist-night");
    assert_eq!(body["data"]["catalogNumber"], "EXM001");
    assert_eq!(body["data"]["artist"]["name"], "Test Artist");

    let (status, body) = t
        .admin("POST", "/api/releases", Some(release_body(&artist, "Night", "EXM002")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "test-artist-night-1");

    let (status, body) = t
        .admin("POST", "/api/releases", Some(release_body(&artist, "Day", "EXM002")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Release with this catalog number already exists");

    let (_, body) = t.get(&format!("/api/artists/{}", artist.slug)).await;
    assert_eq!(body["data"]["totalReleases"], 2);
}

#[tokio::test]
async fn test_create_release_for_unknown_artist() {
    let t = setup().await;
    let ghost = seed_artist(&t.pool, json!({"name": "Ghost"})).await;
    let mut body = release_body(&ghost, "Nothing", "EXM001");
    body["artist"] = json!(uuid::Uuid::new_v4().to_string());

    let (status, body) = t.admin("POST", "/api/releases", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Artist not found");
}

#[tokio::test]
async fn test_create_release_rejects_bad_duration() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Timer"})).await;
    let mut body = release_body(&artist, "Clock", "EXM001");
    body["tracks"][0]["duration"] = json!("4m10s");

    let (status, body) = t.admin("POST", "/api/releases", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "tracks.0.duration");
    assert_eq!(body["details"][0]["message"], "Duration must be in mm:ss format");
}

#[tokio::test]
async fn test_delete_release_updates_artist_count() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Counter"})).await;
    let release = seed_release(&t.pool, release_body(&artist, "Gone", "EXM001")).await;

    let (status, body) = t
        .admin("DELETE", &format!("/api/releases/{}", release.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Release deleted successfully");

    let (_, body) = t.get("/api/artists/counter").await;
    assert_eq!(body["data"]["totalReleases"], 0);

    let (status, _) = t
        .admin("DELETE", &format!("/api/releases/{}", release.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Plays
// =============================================================================

#[tokio::test]
async fn test_track_play_increments_counters() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Player"})).await;
    let release = seed_release(&t.pool, release_body(&artist, "Loop", "EXM001")).await;
    let track_id = release.tracks[0].id.to_string();

    sqlx::query("UPDATE tracks SET plays = 5 WHERE id = ?")
        .bind(&track_id)
        .execute(&t.pool)
        .await
        .unwrap();

    let (status, body) = t
        .send(request(
            "POST",
            &format!("/api/releases/{}/play", release.id),
            Some(json!({"trackId": track_id})),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plays"], 6);

    let (_, body) = t.get("/api/releases/player-loop").await;
    assert_eq!(body["data"]["totalPlays"], 6);
    let (_, body) = t.get("/api/artists/player").await;
    assert_eq!(body["data"]["totalPlays"], 6);
}

#[tokio::test]
async fn test_release_play_without_body() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Quiet"})).await;
    let release = seed_release(&t.pool, release_body(&artist, "Hush", "EXM001")).await;

    let (status, body) = t
        .send(request("POST", &format!("/api/releases/{}/play", release.id), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plays"], 0);

    let (status, body) = t
        .send(request(
            "POST",
            &format!("/api/releases/{}/play", uuid::Uuid::new_v4()),
            None,
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Release not found");
}

#[tokio::test]
async fn test_update_release_keeps_carried_plays() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Editor"})).await;
    let release = seed_release(&t.pool, release_body(&artist, "Draft", "EXM001")).await;
    let kept = release.tracks[0].id.to_string();
    sqlx::query("UPDATE tracks SET plays = 3 WHERE id = ?")
        .bind(&kept)
        .execute(&t.pool)
        .await
        .unwrap();

    let mut body = release_body(&artist, "Draft", "EXM001");
    body["tracks"] = json!([
        {"id": kept, "title": "Opening (edit)", "duration": "4:00", "audioFile": "/uploads/audio/a.mp3", "trackNumber": 1}
    ]);
    let (status, body) = t
        .admin("PUT", &format!("/api/releases/{}", release.id), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "editor-draft");
    assert_eq!(body["data"]["tracks"][0]["plays"], 3);
    assert_eq!(body["data"]["totalPlays"], 3);
}

#[tokio::test]
async fn test_update_release_rejects_repeated_track_id() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Twice"})).await;
    let release = seed_release(&t.pool, release_body(&artist, "Echo", "EXM001")).await;
    let kept = release.tracks[0].id.to_string();

    let mut body = release_body(&artist, "Echo", "EXM001");
    body["tracks"][0]["id"] = json!(kept);
    body["tracks"][1]["id"] = json!(kept);
    let (status, body) = t
        .admin("PUT", &format!("/api/releases/{}", release.id), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "tracks.1.id");

    let (_, body) = t.get("/api/releases/twice-echo").await;
    assert_eq!(body["data"]["tracks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_release_without_track_durations() {
    let t = setup().await;
    let artist = seed_artist(&t.pool, json!({"name": "Untimed"})).await;
    let mut body = release_body(&artist, "Open", "EXM001");
    for track in body["tracks"].as_array_mut().unwrap() {
        track.as_object_mut().unwrap().remove("duration");
    }

    let (status, body) = t.admin("POST", "/api/releases", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["tracks"][0]["duration"].is_null());
}
