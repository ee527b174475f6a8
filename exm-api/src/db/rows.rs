//! Row decoding
//!
//! Ids are TEXT UUIDs, timestamps fixed-width RFC 3339 TEXT, tag sets and
//! link maps JSON TEXT.

use exm_common::models::{
    Artist, ArtistSummary, Release, ReleaseSummary, SocialLinks, Track,
};
use exm_common::time::from_store_string;
use exm_common::{Error, Result};
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

pub const ARTIST_COLUMNS: &str = "a.id, a.slug, a.name, a.bio, a.profile_image, a.genres, \
     a.social_links, a.featured, a.active, a.joined_date, a.total_releases, a.total_plays, \
     a.created_at, a.updated_at";

pub const RELEASE_COLUMNS: &str = "r.id, r.slug, r.title, r.artist_id, r.release_type, r.genres, \
     r.description, r.artwork, r.release_date, r.catalog_number, r.price, r.currency, \
     r.streaming_links, r.featured, r.published, r.total_plays, r.total_downloads, r.tags, \
     r.created_at, r.updated_at";

pub const TRACK_COLUMNS: &str =
    "t.id, t.release_id, t.title, t.duration, t.audio_file, t.track_number, t.featured, t.plays";

pub fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Corrupt id '{}': {}", value, e)))
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    Ok(serde_json::from_str(&raw)?)
}

fn timestamp_column(row: &SqliteRow, column: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.try_get(column)?;
    from_store_string(&raw)
}

fn enum_column<T: std::str::FromStr<Err = String>>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(Error::Internal)
}

pub fn artist_from_row(row: &SqliteRow) -> Result<Artist> {
    Ok(Artist {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        bio: row.try_get("bio")?,
        profile_image: row.try_get("profile_image")?,
        genre: json_column(row, "genres")?,
        social_links: json_column(row, "social_links")?,
        featured: row.try_get("featured")?,
        active: row.try_get("active")?,
        joined_date: timestamp_column(row, "joined_date")?,
        total_releases: row.try_get("total_releases")?,
        total_plays: row.try_get("total_plays")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
        releases: None,
    })
}

/// Release without tracks or artist summary
pub fn release_from_row(row: &SqliteRow) -> Result<Release> {
    Ok(Release {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        artist_id: parse_uuid(&row.try_get::<String, _>("artist_id")?)?,
        release_type: enum_column(row, "release_type")?,
        genre: json_column(row, "genres")?,
        description: row.try_get("description")?,
        artwork: row.try_get("artwork")?,
        tracks: Vec::new(),
        release_date: timestamp_column(row, "release_date")?,
        catalog_number: row.try_get("catalog_number")?,
        price: row.try_get("price")?,
        currency: enum_column(row, "currency")?,
        streaming_links: json_column(row, "streaming_links")?,
        featured: row.try_get("featured")?,
        published: row.try_get("published")?,
        total_plays: row.try_get("total_plays")?,
        total_downloads: row.try_get("total_downloads")?,
        tags: json_column(row, "tags")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
        artist: None,
    })
}

/// Track plus the id of its release
pub fn track_from_row(row: &SqliteRow) -> Result<(String, Track)> {
    let release_id: String = row.try_get("release_id")?;
    let track = Track {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        title: row.try_get("title")?,
        duration: row.try_get("duration")?,
        audio_file: row.try_get("audio_file")?,
        track_number: row.try_get("track_number")?,
        featured: row.try_get("featured")?,
        plays: row.try_get("plays")?,
    };
    Ok((release_id, track))
}

/// `{id, name, slug, profileImage}` plus bio and social links when `detailed`
pub fn artist_summary_from_row(row: &SqliteRow, detailed: bool) -> Result<ArtistSummary> {
    let (bio, social_links) = if detailed {
        let links: SocialLinks = json_column(row, "social_links")?;
        (row.try_get("bio")?, Some(links))
    } else {
        (None, None)
    };
    Ok(ArtistSummary {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        profile_image: row.try_get("profile_image")?,
        bio,
        social_links,
    })
}

pub fn release_summary_from_row(row: &SqliteRow) -> Result<ReleaseSummary> {
    Ok(ReleaseSummary {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        artwork: row.try_get("artwork")?,
        release_date: timestamp_column(row, "release_date")?,
        total_plays: row.try_get("total_plays")?,
    })
}
