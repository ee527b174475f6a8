//! Play-count and release-count aggregation
//!
//! Denormalized counters are recomputed explicitly by the write paths that
//! change their inputs:
//! - `tracks.plays` -> `releases.total_plays` (sum over the release's tracks)
//! - `releases.total_plays` -> `artists.total_plays` (sum over ALL releases,
//!   published or not)
//! - published releases -> `artists.total_releases` (count)
//!
//! Each recompute is a single statement so it can run on a pool or inside a
//! caller's transaction.

use exm_common::time::{now, to_store_string};
use exm_common::{Error, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, error};

/// `releases.total_plays = sum(tracks.plays)`
pub async fn recompute_release_plays<'c>(
    executor: impl SqliteExecutor<'c>,
    release_id: &str,
) -> Result<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE releases
        SET total_plays = (SELECT COALESCE(SUM(plays), 0) FROM tracks WHERE release_id = releases.id),
            updated_at = ?
        WHERE id = ?
        RETURNING total_plays
        "#,
    )
    .bind(to_store_string(&now()))
    .bind(release_id)
    .fetch_optional(executor)
    .await?;

    total.ok_or_else(|| Error::NotFound("Release not found".to_string()))
}

/// `artists.total_plays = sum(releases.total_plays)` over every release of
/// the artist
pub async fn recompute_artist_plays<'c>(
    executor: impl SqliteExecutor<'c>,
    artist_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE artists
        SET total_plays = (SELECT COALESCE(SUM(total_plays), 0) FROM releases WHERE artist_id = artists.id),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(to_store_string(&now()))
    .bind(artist_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// `artists.total_releases = count(published releases)`
pub async fn recompute_artist_release_count<'c>(
    executor: impl SqliteExecutor<'c>,
    artist_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE artists
        SET total_releases = (SELECT COUNT(*) FROM releases WHERE artist_id = artists.id AND published = 1),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(to_store_string(&now()))
    .bind(artist_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Result of a play event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOutcome {
    /// Track's new count when a known track was played, else the release total
    pub plays: i64,
    pub release_total: i64,
    pub track_found: bool,
}

/// Record one play of a release (optionally of one of its tracks)
///
/// Track increment, release recompute and artist recompute are separate
/// statements with no enclosing transaction. An artist recompute failure is
/// logged and swallowed.
pub async fn record_play(
    pool: &SqlitePool,
    release_id: &str,
    track_id: Option<&str>,
) -> Result<PlayOutcome> {
    let artist_id: Option<String> =
        sqlx::query_scalar("SELECT artist_id FROM releases WHERE id = ?")
            .bind(release_id)
            .fetch_optional(pool)
            .await?;
    let artist_id = artist_id.ok_or_else(|| Error::NotFound("Release not found".to_string()))?;

    let track_plays: Option<i64> = match track_id {
        Some(track_id) => {
            sqlx::query_scalar(
                "UPDATE tracks SET plays = plays + 1 WHERE id = ? AND release_id = ? RETURNING plays",
            )
            .bind(track_id)
            .bind(release_id)
            .fetch_optional(pool)
            .await?
        }
        None => None,
    };
    if track_id.is_some() && track_plays.is_none() {
        debug!("Play for unknown track {:?} on release {}", track_id, release_id);
    }

    let release_total = recompute_release_plays(pool, release_id).await?;

    if let Err(e) = recompute_artist_plays(pool, &artist_id).await {
        error!("Failed to update artist play total for {}: {}", artist_id, e);
    }

    Ok(PlayOutcome {
        plays: track_plays.unwrap_or(release_total),
        release_total,
        track_found: track_plays.is_some(),
    })
}
