//! Database initialization
//!
//! Opens (creating if needed) the SQLite catalog store and applies the
//! idempotent schema. Tag sets and link maps are JSON text columns; tracks
//! live in a child table ordered by `position`.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory store with the full schema
///
/// A single long-lived connection keeps the database alive for the lifetime
/// of the pool.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    info!("Initialized in-memory database");

    Ok(pool)
}

/// Create all catalog tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_artists_table(pool).await?;
    create_releases_table(pool).await?;
    create_tracks_table(pool).await?;
    Ok(())
}

async fn create_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            bio TEXT,
            profile_image TEXT,
            genres TEXT NOT NULL DEFAULT '[]',
            social_links TEXT NOT NULL DEFAULT '{}',
            featured INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            joined_date TEXT NOT NULL,
            total_releases INTEGER NOT NULL DEFAULT 0 CHECK (total_releases >= 0),
            total_plays INTEGER NOT NULL DEFAULT 0 CHECK (total_plays >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_artists_featured ON artists(featured DESC, created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_artists_active ON artists(active)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_releases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS releases (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            artist_id TEXT NOT NULL REFERENCES artists(id),
            release_type TEXT NOT NULL
                CHECK (release_type IN ('single', 'ep', 'album', 'compilation', 'remix')),
            genres TEXT NOT NULL DEFAULT '[]',
            description TEXT,
            artwork TEXT NOT NULL,
            release_date TEXT NOT NULL,
            catalog_number TEXT NOT NULL UNIQUE,
            price REAL NOT NULL DEFAULT 0 CHECK (price >= 0),
            currency TEXT NOT NULL DEFAULT 'USD' CHECK (currency IN ('USD', 'EUR', 'GBP')),
            streaming_links TEXT NOT NULL DEFAULT '{}',
            featured INTEGER NOT NULL DEFAULT 0,
            published INTEGER NOT NULL DEFAULT 0,
            total_plays INTEGER NOT NULL DEFAULT 0 CHECK (total_plays >= 0),
            total_downloads INTEGER NOT NULL DEFAULT 0 CHECK (total_downloads >= 0),
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_releases_artist ON releases(artist_id, release_date DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_releases_published ON releases(published, release_date DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_releases_featured ON releases(featured DESC, release_date DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id TEXT PRIMARY KEY,
            release_id TEXT NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            title TEXT NOT NULL,
            duration TEXT,
            audio_file TEXT NOT NULL,
            track_number INTEGER NOT NULL CHECK (track_number >= 1),
            featured INTEGER NOT NULL DEFAULT 0,
            plays INTEGER NOT NULL DEFAULT 0 CHECK (plays >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_release ON tracks(release_id, position)")
        .execute(pool)
        .await?;

    Ok(())
}
