//! Catalog query layer
//!
//! Translates listing parameters into a filtered, sorted, LIMIT/OFFSET page
//! plus the total match count. Embedded summaries are attached afterwards
//! by the caller (see [`crate::db::artists::attach_releases`] and
//! [`crate::db::releases::attach_artists`]).

pub mod filter;
pub mod params;
pub mod sort;

pub use params::{ArtistFilter, ListQuery, ReleaseFilter};
pub use sort::{SortSpec, SortTarget};

use exm_common::models::{Artist, Release};
use exm_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::releases::load_tracks;
use crate::db::rows::{artist_from_row, release_from_row, ARTIST_COLUMNS, RELEASE_COLUMNS};
use crate::pagination::PageRequest;
use filter::{push_artist_filter, push_release_filter};

/// One page of artists and the total number of matches
pub async fn list_artists(
    pool: &SqlitePool,
    filter: &ArtistFilter,
    sort: &SortSpec,
    page: PageRequest,
) -> Result<(Vec<Artist>, u64)> {
    // Resolve the sort first so an unknown field fails before any query runs
    let order_by = sort.order_by(SortTarget::Artists)?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM artists a WHERE 1 = 1");
    push_artist_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM artists a WHERE 1 = 1",
        ARTIST_COLUMNS
    ));
    push_artist_filter(&mut select, filter);
    select.push(format!(" ORDER BY {}", order_by));
    select
        .push(" LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = select.build().fetch_all(pool).await?;
    let artists = rows.iter().map(artist_from_row).collect::<Result<Vec<_>>>()?;

    Ok((artists, total.max(0) as u64))
}

/// One page of releases (tracks included) and the total number of matches
pub async fn list_releases(
    pool: &SqlitePool,
    filter: &ReleaseFilter,
    sort: &SortSpec,
    page: PageRequest,
) -> Result<(Vec<Release>, u64)> {
    let order_by = sort.order_by(SortTarget::Releases)?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM releases r WHERE 1 = 1");
    push_release_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM releases r WHERE 1 = 1",
        RELEASE_COLUMNS
    ));
    push_release_filter(&mut select, filter);
    select.push(format!(" ORDER BY {}", order_by));
    select
        .push(" LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = select.build().fetch_all(pool).await?;
    let mut releases = rows.iter().map(release_from_row).collect::<Result<Vec<_>>>()?;
    load_tracks(pool, &mut releases).await?;

    Ok((releases, total.max(0) as u64))
}

/// First `limit` rows of a curated list (no total needed)
pub async fn curated_artists(
    pool: &SqlitePool,
    filter: &ArtistFilter,
    sort: &str,
    limit: u32,
) -> Result<Vec<Artist>> {
    let page = PageRequest { page: 1, limit };
    let (artists, _) = list_artists(pool, filter, &SortSpec::parse(None, sort), page).await?;
    Ok(artists)
}

pub async fn curated_releases(
    pool: &SqlitePool,
    filter: &ReleaseFilter,
    sort: &str,
    limit: u32,
) -> Result<Vec<Release>> {
    let page = PageRequest { page: 1, limit };
    let (releases, _) = list_releases(pool, filter, &SortSpec::parse(None, sort), page).await?;
    Ok(releases)
}
