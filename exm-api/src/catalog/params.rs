//! Listing query parameters
//!
//! Raw query strings are accepted as-is and interpreted leniently:
//! malformed numbers fall back to defaults, unknown genres match nothing,
//! `featured` only filters on the literal `"true"`.

use serde::Deserialize;

use super::sort::SortSpec;
use crate::pagination::PageRequest;

pub const ARTIST_PAGE_SIZE: u32 = 10;
pub const RELEASE_PAGE_SIZE: u32 = 12;
pub const ADMIN_PAGE_SIZE: u32 = 20;

pub const ARTIST_DEFAULT_SORT: &str = "-createdAt";
pub const RELEASE_DEFAULT_SORT: &str = "-releaseDate";
pub const ADMIN_DEFAULT_SORT: &str = "-createdAt";

/// Query string of every listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub genre: Option<String>,
    pub featured: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    /// Releases only: owning artist id
    pub artist: Option<String>,
    /// Releases only
    pub release_type: Option<String>,
    /// Admin listings only
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self, default_limit: u32) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref(), default_limit)
    }

    pub fn sort_spec(&self, default: &str) -> SortSpec {
        SortSpec::parse(self.sort.as_deref(), default)
    }

    /// Comma-separated genre list, lowercased
    pub fn genres(&self) -> Vec<String> {
        self.genre
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|g| g.trim().to_ascii_lowercase())
                    .filter(|g| !g.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn featured_only(&self) -> bool {
        self.featured.as_deref() == Some("true")
    }

    /// Whitespace-separated search terms
    pub fn search_terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn non_empty(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

// ========================================
// Visibility
// ========================================

/// Which artists a listing may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistStatus {
    All,
    Active,
    Inactive,
}

impl ArtistStatus {
    /// Admin `status` parameter; anything unrecognised means all
    pub fn from_admin_param(raw: Option<&str>) -> Self {
        match raw {
            Some("active") => ArtistStatus::Active,
            Some("inactive") => ArtistStatus::Inactive,
            _ => ArtistStatus::All,
        }
    }
}

/// Which releases a listing may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    All,
    Published,
    Unpublished,
}

impl ReleaseStatus {
    pub fn from_admin_param(raw: Option<&str>) -> Self {
        match raw {
            Some("published") => ReleaseStatus::Published,
            Some("unpublished") => ReleaseStatus::Unpublished,
            _ => ReleaseStatus::All,
        }
    }
}

// ========================================
// Filters
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistFilter {
    pub status: ArtistStatus,
    pub genres: Vec<String>,
    pub featured_only: bool,
    pub search_terms: Vec<String>,
}

impl ArtistFilter {
    /// Public listing: active artists only
    pub fn public(query: &ListQuery) -> Self {
        ArtistFilter {
            status: ArtistStatus::Active,
            genres: query.genres(),
            featured_only: query.featured_only(),
            search_terms: query.search_terms(),
        }
    }

    /// Admin listing: visibility chosen by `status`
    pub fn admin(query: &ListQuery) -> Self {
        ArtistFilter {
            status: ArtistStatus::from_admin_param(query.status.as_deref()),
            ..ArtistFilter::public(query)
        }
    }

    /// Active, featured artists (curated list)
    pub fn featured() -> Self {
        ArtistFilter {
            status: ArtistStatus::Active,
            genres: Vec::new(),
            featured_only: true,
            search_terms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFilter {
    pub status: ReleaseStatus,
    pub genres: Vec<String>,
    pub featured_only: bool,
    pub search_terms: Vec<String>,
    pub artist_id: Option<String>,
    pub release_type: Option<String>,
}

impl ReleaseFilter {
    /// Public listing: published releases only
    pub fn public(query: &ListQuery) -> Self {
        ReleaseFilter {
            status: ReleaseStatus::Published,
            genres: query.genres(),
            featured_only: query.featured_only(),
            search_terms: query.search_terms(),
            artist_id: ListQuery::non_empty(&query.artist),
            release_type: ListQuery::non_empty(&query.release_type)
                .map(|t| t.to_ascii_lowercase()),
        }
    }

    pub fn admin(query: &ListQuery) -> Self {
        ReleaseFilter {
            status: ReleaseStatus::from_admin_param(query.status.as_deref()),
            ..ReleaseFilter::public(query)
        }
    }

    /// Published releases with no other restriction
    pub fn published() -> Self {
        ReleaseFilter::public(&ListQuery::default())
    }

    /// Published, featured releases (curated list)
    pub fn featured() -> Self {
        ReleaseFilter {
            featured_only: true,
            ..ReleaseFilter::published()
        }
    }
}
