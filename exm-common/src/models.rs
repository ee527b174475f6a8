//! Catalog domain models
//!
//! Artist, Release and Track as they appear on the wire (camelCase JSON).
//! Row decoding lives with the queries in `exm-api`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ========================================
// Enumerations
// ========================================

/// Musical genre tag shared by artists and releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Electronic,
    Techno,
    House,
    Ambient,
    Experimental,
    DrumAndBass,
    Dubstep,
    Trance,
    Other,
}

impl Genre {
    pub const ALL: [Genre; 9] = [
        Genre::Electronic,
        Genre::Techno,
        Genre::House,
        Genre::Ambient,
        Genre::Experimental,
        Genre::DrumAndBass,
        Genre::Dubstep,
        Genre::Trance,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Electronic => "electronic",
            Genre::Techno => "techno",
            Genre::House => "house",
            Genre::Ambient => "ambient",
            Genre::Experimental => "experimental",
            Genre::DrumAndBass => "drum-and-bass",
            Genre::Dubstep => "dubstep",
            Genre::Trance => "trance",
            Genre::Other => "other",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == lowered)
            .ok_or_else(|| format!("Unknown genre: {}", s))
    }
}

/// Kind of release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Single,
    Ep,
    Album,
    Compilation,
    Remix,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Single => "single",
            ReleaseType::Ep => "ep",
            ReleaseType::Album => "album",
            ReleaseType::Compilation => "compilation",
            ReleaseType::Remix => "remix",
        }
    }
}

impl FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(ReleaseType::Single),
            "ep" => Ok(ReleaseType::Ep),
            "album" => Ok(ReleaseType::Album),
            "compilation" => Ok(ReleaseType::Compilation),
            "remix" => Ok(ReleaseType::Remix),
            other => Err(format!("Unknown release type: {}", other)),
        }
    }
}

/// Price currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(format!("Unknown currency: {}", other)),
        }
    }
}

// ========================================
// Link maps (stored as JSON columns)
// ========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soundcloud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_music: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soundcloud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandcamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beatport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
}

// ========================================
// Entities
// ========================================

/// A label artist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub genre: Vec<Genre>,
    pub social_links: SocialLinks,
    pub featured: bool,
    pub active: bool,
    pub joined_date: DateTime<Utc>,
    pub total_releases: i64,
    pub total_plays: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Embedded published releases, latest first (only when populated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub releases: Option<Vec<ReleaseSummary>>,
}

/// A track owned by a release
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub duration: Option<String>,
    pub audio_file: String,
    pub track_number: i64,
    pub featured: bool,
    pub plays: i64,
}

/// A release (single, EP, album...) with its ordered tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub artist_id: Uuid,
    pub release_type: ReleaseType,
    pub genre: Vec<Genre>,
    pub description: Option<String>,
    pub artwork: String,
    pub tracks: Vec<Track>,
    pub release_date: DateTime<Utc>,
    pub catalog_number: String,
    pub price: f64,
    pub currency: Currency,
    pub streaming_links: StreamingLinks,
    pub featured: bool,
    pub published: bool,
    pub total_plays: i64,
    pub total_downloads: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Embedded artist summary (only when populated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<ArtistSummary>,
}

impl Release {
    /// Sum of track play counters
    pub fn track_play_total(&self) -> i64 {
        self.tracks.iter().map(|t| t.plays).sum()
    }
}

// ========================================
// Embedded summaries
// ========================================

/// Artist fields embedded in release responses
///
/// `bio` and `social_links` are only filled for release detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
}

/// Release fields embedded in artist responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub artwork: String,
    pub release_date: DateTime<Utc>,
    pub total_plays: i64,
}
