//! Artist persistence

use std::collections::HashMap;

use exm_common::error::is_unique_violation;
use exm_common::models::{Artist, ReleaseSummary, SocialLinks};
use exm_common::slug::slugify;
use exm_common::time::{now, to_store_string};
use exm_common::{Error, Result};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::rows::{artist_from_row, release_summary_from_row, ARTIST_COLUMNS};
use crate::validation::ArtistInput;

const DUPLICATE_NAME: &str = "Artist with this name already exists";

/// Load an artist by id regardless of visibility
///
/// Ids that are not valid UUIDs simply match nothing.
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Artist>> {
    let row = sqlx::query(&format!("SELECT {} FROM artists a WHERE a.id = ?", ARTIST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(artist_from_row).transpose()
}

/// Load an active artist by slug
pub async fn find_active_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Artist>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM artists a WHERE a.slug = ? AND a.active = 1",
        ARTIST_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(artist_from_row).transpose()
}

/// Clearable optional text: `""` clears, anything else replaces
fn merge_text(current: Option<String>, input: Option<String>) -> Option<String> {
    match input {
        Some(s) if s.is_empty() => None,
        Some(s) => Some(s),
        None => current,
    }
}

/// Apply a validated body to an artist record (slug follows the name)
fn apply_input(artist: &mut Artist, input: ArtistInput) {
    artist.slug = slugify(&input.name);
    artist.name = input.name;
    artist.bio = merge_text(artist.bio.take(), input.bio);
    artist.profile_image = merge_text(artist.profile_image.take(), input.profile_image);
    if let Some(genre) = input.genre {
        artist.genre = genre;
    }
    if let Some(links) = input.social_links {
        artist.social_links = links;
    }
    if let Some(featured) = input.featured {
        artist.featured = featured;
    }
    if let Some(active) = input.active {
        artist.active = active;
    }
}

fn map_write_error(e: sqlx::Error) -> Error {
    if is_unique_violation(&e) {
        Error::Conflict(DUPLICATE_NAME.to_string())
    } else {
        Error::Database(e)
    }
}

async fn write_row(pool: &SqlitePool, artist: &Artist, insert: bool) -> Result<()> {
    let sql = if insert {
        r#"
        INSERT INTO artists (
            slug, name, bio, profile_image, genres, social_links, featured, active,
            joined_date, total_releases, total_plays, created_at, updated_at, id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    } else {
        r#"
        UPDATE artists SET
            slug = ?, name = ?, bio = ?, profile_image = ?, genres = ?, social_links = ?,
            featured = ?, active = ?, joined_date = ?, total_releases = ?, total_plays = ?,
            created_at = ?, updated_at = ?
        WHERE id = ?
        "#
    };

    sqlx::query(sql)
        .bind(&artist.slug)
        .bind(&artist.name)
        .bind(&artist.bio)
        .bind(&artist.profile_image)
        .bind(serde_json::to_string(&artist.genre)?)
        .bind(serde_json::to_string(&artist.social_links)?)
        .bind(artist.featured)
        .bind(artist.active)
        .bind(to_store_string(&artist.joined_date))
        .bind(artist.total_releases)
        .bind(artist.total_plays)
        .bind(to_store_string(&artist.created_at))
        .bind(to_store_string(&artist.updated_at))
        .bind(artist.id.to_string())
        .execute(pool)
        .await
        .map_err(map_write_error)?;

    Ok(())
}

/// Create an artist
pub async fn insert(pool: &SqlitePool, input: ArtistInput) -> Result<Artist> {
    let ts = now();
    let mut artist = Artist {
        id: Uuid::new_v4(),
        slug: String::new(),
        name: String::new(),
        bio: None,
        profile_image: None,
        genre: Vec::new(),
        social_links: SocialLinks::default(),
        featured: false,
        active: true,
        joined_date: ts,
        total_releases: 0,
        total_plays: 0,
        created_at: ts,
        updated_at: ts,
        releases: None,
    };
    apply_input(&mut artist, input);

    write_row(pool, &artist, true).await?;
    info!("Created artist {} ({})", artist.slug, artist.id);
    Ok(artist)
}

/// Update an artist; `None` if it does not exist
pub async fn update(pool: &SqlitePool, id: &str, input: ArtistInput) -> Result<Option<Artist>> {
    let Some(mut artist) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    apply_input(&mut artist, input);
    artist.updated_at = now();

    write_row(pool, &artist, false).await?;
    Ok(Some(artist))
}

/// What `delete` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistRemoval {
    /// Releases still reference the artist; it was marked inactive
    Deactivated,
    Deleted,
}

/// Delete an artist, or deactivate it when releases reference it
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<Option<ArtistRemoval>> {
    if find_by_id(pool, id).await?.is_none() {
        return Ok(None);
    }

    let releases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM releases WHERE artist_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    if releases > 0 {
        sqlx::query("UPDATE artists SET active = 0, updated_at = ? WHERE id = ?")
            .bind(to_store_string(&now()))
            .bind(id)
            .execute(pool)
            .await?;
        info!("Deactivated artist {} ({} releases)", id, releases);
        Ok(Some(ArtistRemoval::Deactivated))
    } else {
        sqlx::query("DELETE FROM artists WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        info!("Deleted artist {}", id);
        Ok(Some(ArtistRemoval::Deleted))
    }
}

/// Flip the featured flag
pub async fn toggle_featured(pool: &SqlitePool, id: &str) -> Result<Option<Artist>> {
    let result = sqlx::query("UPDATE artists SET featured = NOT featured, updated_at = ? WHERE id = ?")
        .bind(to_store_string(&now()))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Embed release summaries, latest first
///
/// `per_artist` caps the number per artist (`None` = all);
/// `published_only` hides drafts.
pub async fn attach_releases(
    pool: &SqlitePool,
    artists: &mut [Artist],
    per_artist: Option<u32>,
    published_only: bool,
) -> Result<()> {
    if artists.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, title, slug, artwork, release_date, total_plays, artist_id FROM (\
         SELECT r.id, r.title, r.slug, r.artwork, r.release_date, r.total_plays, r.artist_id, \
         ROW_NUMBER() OVER (PARTITION BY r.artist_id ORDER BY r.release_date DESC, r.rowid ASC) AS rn \
         FROM releases r WHERE r.artist_id IN (",
    );
    let mut ids = qb.separated(", ");
    for artist in artists.iter() {
        ids.push_bind(artist.id.to_string());
    }
    ids.push_unseparated(")");
    if published_only {
        qb.push(" AND r.published = 1");
    }
    qb.push(")");
    if let Some(n) = per_artist {
        qb.push(" WHERE rn <= ").push_bind(n as i64);
    }
    qb.push(" ORDER BY artist_id, rn");

    let rows = qb.build().fetch_all(pool).await?;
    let mut grouped: HashMap<String, Vec<ReleaseSummary>> = HashMap::new();
    for row in &rows {
        let artist_id: String = row.try_get("artist_id")?;
        grouped
            .entry(artist_id)
            .or_default()
            .push(release_summary_from_row(row)?);
    }

    for artist in artists.iter_mut() {
        artist.releases = Some(grouped.remove(&artist.id.to_string()).unwrap_or_default());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exm_common::db::init_in_memory;
    use exm_common::models::Genre;

    fn input(name: &str) -> ArtistInput {
        ArtistInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_slug_and_defaults() {
        let pool = init_in_memory().await.unwrap();
        let artist = insert(&pool, input("Test Artist")).await.unwrap();

        assert_eq!(artist.slug, "test-artist");
        assert!(artist.active);
        assert!(!artist.featured);
        assert_eq!(artist.total_plays, 0);

        let loaded = find_active_by_slug(&pool, "test-artist").await.unwrap().unwrap();
        assert_eq!(loaded.id, artist.id);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let pool = init_in_memory().await.unwrap();
        insert(&pool, input("Test Artist")).await.unwrap();

        let err = insert(&pool, input("Test Artist!!")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(m) if m == DUPLICATE_NAME));
    }

    #[tokio::test]
    async fn test_update_merges_and_reslugs() {
        let pool = init_in_memory().await.unwrap();
        let created = insert(
            &pool,
            ArtistInput {
                name: "Old Name".into(),
                bio: Some("Bio".into()),
                genre: Some(vec![Genre::Techno]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update(
            &pool,
            &created.id.to_string(),
            ArtistInput {
                name: "New Name".into(),
                featured: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.slug, "new-name");
        assert_eq!(updated.bio.as_deref(), Some("Bio"));
        assert_eq!(updated.genre, vec![Genre::Techno]);
        assert!(updated.featured);

        let cleared = update(
            &pool,
            &created.id.to_string(),
            ArtistInput {
                name: "New Name".into(),
                bio: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(cleared.bio.is_none());
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let pool = init_in_memory().await.unwrap();
        assert!(find_by_id(&pool, "not-a-uuid").await.unwrap().is_none());
        assert!(update(&pool, &Uuid::new_v4().to_string(), input("X")).await.unwrap().is_none());
        assert!(delete(&pool, "nope").await.unwrap().is_none());
        assert!(toggle_featured(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_featured_flips() {
        let pool = init_in_memory().await.unwrap();
        let artist = insert(&pool, input("Flip")).await.unwrap();
        let id = artist.id.to_string();

        assert!(toggle_featured(&pool, &id).await.unwrap().unwrap().featured);
        assert!(!toggle_featured(&pool, &id).await.unwrap().unwrap().featured);
    }

    #[tokio::test]
    async fn test_delete_without_releases_is_hard() {
        let pool = init_in_memory().await.unwrap();
        let artist = insert(&pool, input("Gone")).await.unwrap();
        let id = artist.id.to_string();

        assert_eq!(delete(&pool, &id).await.unwrap(), Some(ArtistRemoval::Deleted));
        assert!(find_by_id(&pool, &id).await.unwrap().is_none());
    }
}
