//! Release and track persistence
//!
//! A release and its tracks are always written together in one
//! transaction; tracks are replaced wholesale, keeping the play counter of
//! every track whose id is carried over.

use std::collections::{HashMap, HashSet};

use exm_common::error::is_unique_violation;
use exm_common::models::{Release, Track};
use exm_common::slug::{release_slug_base, with_suffix};
use exm_common::time::{now, to_store_string};
use exm_common::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::aggregate::recompute_artist_release_count;
use super::rows::{
    artist_summary_from_row, release_from_row, track_from_row, ARTIST_COLUMNS, RELEASE_COLUMNS,
    TRACK_COLUMNS,
};
use crate::validation::{ReleaseInput, TrackInput};

const DUPLICATE_CATALOG_NUMBER: &str = "Release with this catalog number already exists";
const DUPLICATE_SLUG: &str = "Release with this title already exists for this artist";

// ========================================
// Reads
// ========================================

/// Load a release (with tracks) regardless of visibility
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Release>> {
    let row = sqlx::query(&format!("SELECT {} FROM releases r WHERE r.id = ?", RELEASE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let mut releases = vec![release_from_row(&row)?];
    load_tracks(pool, &mut releases).await?;
    Ok(releases.pop())
}

/// Load a published release by slug with tracks and the detailed artist
/// summary
pub async fn find_published_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Release>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM releases r WHERE r.slug = ? AND r.published = 1",
        RELEASE_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let mut releases = vec![release_from_row(&row)?];
    load_tracks(pool, &mut releases).await?;
    attach_artists(pool, &mut releases, true).await?;
    Ok(releases.pop())
}

/// Fill `tracks` of every release, in stored order
pub async fn load_tracks(pool: &SqlitePool, releases: &mut [Release]) -> Result<()> {
    if releases.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM tracks t WHERE t.release_id IN (",
        TRACK_COLUMNS
    ));
    let mut ids = qb.separated(", ");
    for release in releases.iter() {
        ids.push_bind(release.id.to_string());
    }
    ids.push_unseparated(") ORDER BY t.release_id, t.position");

    let rows = qb.build().fetch_all(pool).await?;
    let mut grouped: HashMap<String, Vec<Track>> = HashMap::new();
    for row in &rows {
        let (release_id, track) = track_from_row(row)?;
        grouped.entry(release_id).or_default().push(track);
    }

    for release in releases.iter_mut() {
        release.tracks = grouped.remove(&release.id.to_string()).unwrap_or_default();
    }
    Ok(())
}

/// Embed the owning artist's summary; `detailed` adds bio and social links
pub async fn attach_artists(pool: &SqlitePool, releases: &mut [Release], detailed: bool) -> Result<()> {
    if releases.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM artists a WHERE a.id IN (",
        ARTIST_COLUMNS
    ));
    let mut ids = qb.separated(", ");
    for release in releases.iter() {
        ids.push_bind(release.artist_id.to_string());
    }
    ids.push_unseparated(")");

    let rows = qb.build().fetch_all(pool).await?;
    let mut summaries = HashMap::with_capacity(rows.len());
    for row in &rows {
        let summary = artist_summary_from_row(row, detailed)?;
        summaries.insert(summary.id, summary);
    }

    for release in releases.iter_mut() {
        release.artist = summaries.get(&release.artist_id).cloned();
    }
    Ok(())
}

// ========================================
// Writes
// ========================================

/// Smallest free slug: `base`, else `base-N` for the least N >= 1
///
/// `exclude_id` is the release being renamed (its own slug is free to it).
async fn unique_release_slug(
    conn: &mut SqliteConnection,
    base: &str,
    exclude_id: &str,
) -> Result<String> {
    let taken: Vec<String> = sqlx::query_scalar(
        "SELECT slug FROM releases WHERE (slug = ? OR substr(slug, 1, ?) = ?) AND id != ?",
    )
    .bind(base)
    .bind(base.len() as i64 + 1)
    .bind(format!("{}-", base))
    .bind(exclude_id)
    .fetch_all(&mut *conn)
    .await?;

    if !taken.iter().any(|s| s == base) {
        return Ok(base.to_string());
    }
    let mut n = 1;
    loop {
        let candidate = with_suffix(base, n);
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

async fn artist_name(conn: &mut SqliteConnection, artist_id: &Uuid) -> Result<String> {
    let name: Option<String> = sqlx::query_scalar("SELECT name FROM artists WHERE id = ?")
        .bind(artist_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    name.ok_or_else(|| Error::InvalidInput("Artist not found".to_string()))
}

fn map_write_error(e: sqlx::Error) -> Error {
    if is_unique_violation(&e) {
        let on_slug = e
            .as_database_error()
            .is_some_and(|db| db.message().contains("releases.slug"));
        Error::Conflict(if on_slug { DUPLICATE_SLUG } else { DUPLICATE_CATALOG_NUMBER }.to_string())
    } else {
        Error::Database(e)
    }
}

/// Tracks for a save; `previous` holds the release's current tracks
///
/// A previous track is carried over at most once; a repeated id gets a new
/// track with zero plays.
fn build_tracks(inputs: Vec<TrackInput>, previous: &[Track]) -> Vec<Track> {
    let mut used = HashSet::new();
    inputs
        .into_iter()
        .map(|input| {
            let carried = input
                .id
                .filter(|id| used.insert(*id))
                .and_then(|id| previous.iter().find(|t| t.id == id));
            Track {
                id: carried.map(|t| t.id).unwrap_or_else(Uuid::new_v4),
                title: input.title,
                duration: input.duration,
                audio_file: input.audio_file,
                track_number: input.track_number,
                featured: input.featured,
                plays: carried.map(|t| t.plays).unwrap_or(0),
            }
        })
        .collect()
}

async fn write_release(conn: &mut SqliteConnection, release: &Release, insert: bool) -> Result<()> {
    let sql = if insert {
        r#"
        INSERT INTO releases (
            slug, title, artist_id, release_type, genres, description, artwork, release_date,
            catalog_number, price, currency, streaming_links, featured, published, total_plays,
            total_downloads, tags, created_at, updated_at, id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    } else {
        r#"
        UPDATE releases SET
            slug = ?, title = ?, artist_id = ?, release_type = ?, genres = ?, description = ?,
            artwork = ?, release_date = ?, catalog_number = ?, price = ?, currency = ?,
            streaming_links = ?, featured = ?, published = ?, total_plays = ?,
            total_downloads = ?, tags = ?, created_at = ?, updated_at = ?
        WHERE id = ?
        "#
    };

    sqlx::query(sql)
        .bind(&release.slug)
        .bind(&release.title)
        .bind(release.artist_id.to_string())
        .bind(release.release_type.as_str())
        .bind(serde_json::to_string(&release.genre)?)
        .bind(&release.description)
        .bind(&release.artwork)
        .bind(to_store_string(&release.release_date))
        .bind(&release.catalog_number)
        .bind(release.price)
        .bind(release.currency.as_str())
        .bind(serde_json::to_string(&release.streaming_links)?)
        .bind(release.featured)
        .bind(release.published)
        .bind(release.total_plays)
        .bind(release.total_downloads)
        .bind(serde_json::to_string(&release.tags)?)
        .bind(to_store_string(&release.created_at))
        .bind(to_store_string(&release.updated_at))
        .bind(release.id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(map_write_error)?;

    let release_id = release.id.to_string();
    sqlx::query("DELETE FROM tracks WHERE release_id = ?")
        .bind(&release_id)
        .execute(&mut *conn)
        .await?;

    for (position, track) in release.tracks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO tracks (id, release_id, position, title, duration, audio_file, track_number, featured, plays)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(track.id.to_string())
        .bind(&release_id)
        .bind(position as i64)
        .bind(&track.title)
        .bind(&track.duration)
        .bind(&track.audio_file)
        .bind(track.track_number)
        .bind(track.featured)
        .bind(track.plays)
        .execute(&mut *conn)
        .await
        .map_err(map_write_error)?;
    }

    Ok(())
}

/// Create a release
///
/// The artist must exist; the slug is de-duplicated; the artist's
/// published-release count is recomputed.
pub async fn insert(pool: &SqlitePool, input: ReleaseInput) -> Result<Release> {
    let mut tx = pool.begin().await?;

    let name = artist_name(&mut tx, &input.artist_id).await?;
    let id = Uuid::new_v4();
    let slug = unique_release_slug(
        &mut tx,
        &release_slug_base(&name, &input.title),
        &id.to_string(),
    )
    .await?;

    let ts = now();
    let release = Release {
        id,
        slug,
        title: input.title,
        artist_id: input.artist_id,
        release_type: input.release_type,
        genre: input.genre.unwrap_or_default(),
        description: input.description.filter(|d| !d.is_empty()),
        artwork: input.artwork,
        tracks: build_tracks(input.tracks, &[]),
        release_date: input.release_date,
        catalog_number: input.catalog_number,
        price: input.price.unwrap_or(0.0),
        currency: input.currency.unwrap_or_default(),
        streaming_links: input.streaming_links.unwrap_or_default(),
        featured: input.featured.unwrap_or(false),
        published: input.published.unwrap_or(false),
        total_plays: 0,
        total_downloads: 0,
        tags: input.tags.unwrap_or_default(),
        created_at: ts,
        updated_at: ts,
        artist: None,
    };

    write_release(&mut tx, &release, true).await?;
    recompute_artist_release_count(&mut *tx, &release.artist_id.to_string()).await?;
    tx.commit().await?;

    info!("Created release {} ({})", release.slug, release.id);
    Ok(release)
}

/// Replace a release's content; `None` if it does not exist
pub async fn update(pool: &SqlitePool, id: &str, input: ReleaseInput) -> Result<Option<Release>> {
    let Some(mut release) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let previous_artist = release.artist_id;

    let mut tx = pool.begin().await?;
    let name = artist_name(&mut tx, &input.artist_id).await?;

    if input.title != release.title {
        release.slug = unique_release_slug(&mut tx, &release_slug_base(&name, &input.title), id).await?;
    }
    release.title = input.title;
    release.artist_id = input.artist_id;
    release.release_type = input.release_type;
    if let Some(genre) = input.genre {
        release.genre = genre;
    }
    match input.description {
        Some(d) if d.is_empty() => release.description = None,
        Some(d) => release.description = Some(d),
        None => {}
    }
    release.artwork = input.artwork;
    release.tracks = build_tracks(input.tracks, &release.tracks);
    release.total_plays = release.track_play_total();
    release.release_date = input.release_date;
    release.catalog_number = input.catalog_number;
    if let Some(price) = input.price {
        release.price = price;
    }
    if let Some(currency) = input.currency {
        release.currency = currency;
    }
    if let Some(links) = input.streaming_links {
        release.streaming_links = links;
    }
    if let Some(featured) = input.featured {
        release.featured = featured;
    }
    if let Some(published) = input.published {
        release.published = published;
    }
    if let Some(tags) = input.tags {
        release.tags = tags;
    }
    release.updated_at = now();

    write_release(&mut tx, &release, false).await?;
    recompute_artist_release_count(&mut *tx, &release.artist_id.to_string()).await?;
    if previous_artist != release.artist_id {
        recompute_artist_release_count(&mut *tx, &previous_artist.to_string()).await?;
    }
    tx.commit().await?;

    Ok(Some(release))
}

/// Delete a release and its tracks; false if it did not exist
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let artist_id: Option<String> =
        sqlx::query_scalar("DELETE FROM releases WHERE id = ? RETURNING artist_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(artist_id) = artist_id else {
        return Ok(false);
    };

    recompute_artist_release_count(&mut *tx, &artist_id).await?;
    tx.commit().await?;

    info!("Deleted release {}", id);
    Ok(true)
}

/// Flip the featured flag
pub async fn toggle_featured(pool: &SqlitePool, id: &str) -> Result<Option<Release>> {
    let result = sqlx::query("UPDATE releases SET featured = NOT featured, updated_at = ? WHERE id = ?")
        .bind(to_store_string(&now()))
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Flip the published flag and recompute the artist's release count
pub async fn toggle_published(pool: &SqlitePool, id: &str) -> Result<Option<Release>> {
    let mut tx = pool.begin().await?;
    let artist_id: Option<String> = sqlx::query_scalar(
        "UPDATE releases SET published = NOT published, updated_at = ? WHERE id = ? RETURNING artist_id",
    )
    .bind(to_store_string(&now()))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(artist_id) = artist_id else {
        return Ok(None);
    };

    recompute_artist_release_count(&mut *tx, &artist_id).await?;
    tx.commit().await?;

    find_by_id(pool, id).await
}
