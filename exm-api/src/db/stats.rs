//! Admin dashboard and analytics queries

use chrono::{DateTime, Datelike, TimeZone, Utc};
use exm_common::models::Release;
use exm_common::time::to_store_string;
use exm_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use super::releases::{attach_artists, load_tracks};
use super::rows::{parse_uuid, release_from_row, RELEASE_COLUMNS};

// ========================================
// Dashboard
// ========================================

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_artists: i64,
    pub active_artists: i64,
    pub total_releases: i64,
    pub published_releases: i64,
    pub featured_artists: i64,
    pub featured_releases: i64,
    /// Sum over published releases only
    pub total_plays: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopArtist {
    pub id: uuid::Uuid,
    pub name: String,
    pub slug: String,
    pub profile_image: Option<String>,
    pub total_plays: i64,
    pub total_releases: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenreCount {
    pub genre: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub recent_releases: Vec<Release>,
    pub top_artists: Vec<TopArtist>,
    pub genre_stats: Vec<GenreCount>,
    pub monthly_stats: Vec<MonthCount>,
}

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
}

pub async fn overview(pool: &SqlitePool) -> Result<Overview> {
    Ok(Overview {
        total_artists: count(pool, "SELECT COUNT(*) FROM artists").await?,
        active_artists: count(pool, "SELECT COUNT(*) FROM artists WHERE active = 1").await?,
        total_releases: count(pool, "SELECT COUNT(*) FROM releases").await?,
        published_releases: count(pool, "SELECT COUNT(*) FROM releases WHERE published = 1").await?,
        featured_artists: count(pool, "SELECT COUNT(*) FROM artists WHERE featured = 1").await?,
        featured_releases: count(pool, "SELECT COUNT(*) FROM releases WHERE featured = 1").await?,
        total_plays: count(
            pool,
            "SELECT COALESCE(SUM(total_plays), 0) FROM releases WHERE published = 1",
        )
        .await?,
    })
}

async fn recent_releases(pool: &SqlitePool, limit: i64) -> Result<Vec<Release>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM releases r WHERE r.published = 1 ORDER BY r.release_date DESC, r.rowid ASC LIMIT ?",
        RELEASE_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut releases = rows.iter().map(release_from_row).collect::<Result<Vec<_>>>()?;
    load_tracks(pool, &mut releases).await?;
    attach_artists(pool, &mut releases, false).await?;
    Ok(releases)
}

async fn top_artists(pool: &SqlitePool, limit: i64) -> Result<Vec<TopArtist>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, slug, profile_image, total_plays, total_releases
        FROM artists
        WHERE active = 1
        ORDER BY total_plays DESC, total_releases DESC, rowid ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(TopArtist {
                id: parse_uuid(&row.try_get::<String, _>("id")?)?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                profile_image: row.try_get("profile_image")?,
                total_plays: row.try_get("total_plays")?,
                total_releases: row.try_get("total_releases")?,
            })
        })
        .collect()
}

/// Releases per genre over published releases, most common first
pub async fn genre_histogram(pool: &SqlitePool) -> Result<Vec<GenreCount>> {
    let rows = sqlx::query(
        r#"
        SELECT g.value AS genre, COUNT(*) AS count
        FROM releases r, json_each(r.genres) g
        WHERE r.published = 1
        GROUP BY g.value
        ORDER BY count DESC, genre ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(GenreCount {
                genre: row.try_get("genre")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

/// First instant of the month eleven months before `now`
fn monthly_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let months = now.year() * 12 + now.month0() as i32 - 11;
    let (year, month0) = (months.div_euclid(12), months.rem_euclid(12) as u32);
    Utc.with_ymd_and_hms(year, month0 + 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Published releases per month over the last twelve months, oldest first
pub async fn monthly_histogram(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<MonthCount>> {
    let rows = sqlx::query(
        r#"
        SELECT CAST(substr(release_date, 1, 4) AS INTEGER) AS year,
               CAST(substr(release_date, 6, 2) AS INTEGER) AS month,
               COUNT(*) AS count
        FROM releases
        WHERE published = 1 AND release_date >= ?
        GROUP BY year, month
        ORDER BY year ASC, month ASC
        "#,
    )
    .bind(to_store_string(&monthly_window_start(now)))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(MonthCount {
                year: row.try_get::<i64, _>("year")? as i32,
                month: row.try_get::<i64, _>("month")? as u32,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

pub async fn dashboard(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Dashboard> {
    Ok(Dashboard {
        overview: overview(pool).await?,
        recent_releases: recent_releases(pool, 5).await?,
        top_artists: top_artists(pool, 5).await?,
        genre_stats: genre_histogram(pool).await?,
        monthly_stats: monthly_histogram(pool, now).await?,
    })
}

// ========================================
// Analytics
// ========================================

/// Reporting period; unrecognised values fall back to 30 days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("7d") => Period::Week,
            Some("90d") => Period::Quarter,
            Some("1y") => Period::Year,
            _ => Period::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Quarter => "90d",
            Period::Year => "1y",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopTrack {
    pub track_title: String,
    pub track_plays: i64,
    pub release_title: String,
    pub artist_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenreShare {
    pub genre: String,
    pub count: i64,
    pub plays: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub release_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub top_tracks: Vec<TopTrack>,
    pub genre_distribution: Vec<GenreShare>,
    pub release_type_distribution: Vec<TypeCount>,
    pub period: &'static str,
}

/// Analytics over published releases
///
/// The period is reported back but does not narrow the figures, which are
/// all-time counters.
pub async fn analytics(pool: &SqlitePool, period: Period) -> Result<Analytics> {
    let tracks = sqlx::query(
        r#"
        SELECT t.title AS track_title, t.plays AS track_plays, r.title AS release_title, a.name AS artist_name
        FROM tracks t
        JOIN releases r ON r.id = t.release_id
        LEFT JOIN artists a ON a.id = r.artist_id
        WHERE r.published = 1
        ORDER BY t.plays DESC, t.rowid ASC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await?;

    let top_tracks = tracks
        .iter()
        .map(|row| {
            Ok(TopTrack {
                track_title: row.try_get("track_title")?,
                track_plays: row.try_get("track_plays")?,
                release_title: row.try_get("release_title")?,
                artist_name: row.try_get("artist_name")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let genres = sqlx::query(
        r#"
        SELECT g.value AS genre, COUNT(*) AS count, COALESCE(SUM(r.total_plays), 0) AS plays
        FROM releases r, json_each(r.genres) g
        WHERE r.published = 1
        GROUP BY g.value
        ORDER BY count DESC, genre ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let genre_distribution = genres
        .iter()
        .map(|row| {
            Ok(GenreShare {
                genre: row.try_get("genre")?,
                count: row.try_get("count")?,
                plays: row.try_get("plays")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let types = sqlx::query(
        r#"
        SELECT release_type, COUNT(*) AS count
        FROM releases
        WHERE published = 1
        GROUP BY release_type
        ORDER BY count DESC, release_type ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let release_type_distribution = types
        .iter()
        .map(|row| {
            Ok(TypeCount {
                release_type: row.try_get("release_type")?,
                count: row.try_get("count")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Analytics {
        top_tracks,
        genre_distribution,
        release_type_distribution,
        period: period.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exm_common::db::init_in_memory;

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse(Some("7d")).as_str(), "7d");
        assert_eq!(Period::parse(Some("1y")).as_str(), "1y");
        assert_eq!(Period::parse(Some("2w")).as_str(), "30d");
        assert_eq!(Period::parse(None), Period::Month);
    }

    #[test]
    fn test_monthly_window_crosses_year() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let start = monthly_window_start(now);
        assert_eq!((start.year(), start.month(), start.day()), (2023, 4, 1));

        let now = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(monthly_window_start(now).month(), 1);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let pool = init_in_memory().await.unwrap();
        let d = dashboard(&pool, Utc::now()).await.unwrap();
        assert_eq!(d.overview, Overview::default());
        assert!(d.recent_releases.is_empty());
        assert!(d.monthly_stats.is_empty());

        let a = analytics(&pool, Period::Week).await.unwrap();
        assert!(a.top_tracks.is_empty());
        assert_eq!(a.period, "7d");
    }
}
