//! Request body validation
//!
//! Bodies arrive as untyped JSON and are checked field by field; every
//! failed rule is collected (not only the first) and reported as
//! `{field, message}` with dotted paths such as `tracks.0.title`. A body
//! that passes yields a typed input struct. Keys outside the schema are
//! ignored.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use exm_common::api::types::FieldError;
use exm_common::models::{Currency, Genre, ReleaseType, SocialLinks, StreamingLinks};
use exm_common::slug::slugify;
use exm_common::time::parse_user_date;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static DURATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap());
static INSTAGRAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?instagram\.com/").unwrap());
static TWITTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://(www\.)?twitter\.com/").unwrap());
static SOUNDCLOUD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?soundcloud\.com/").unwrap());
static SPOTIFY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://(open\.)?spotify\.com/").unwrap());
static WEBSITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").unwrap());

// ========================================
// Typed inputs
// ========================================

/// Validated artist create/update body
///
/// `None` means "not supplied"; `Some("")` on an optional text field clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistInput {
    pub name: String,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub genre: Option<Vec<Genre>>,
    pub social_links: Option<SocialLinks>,
    pub featured: Option<bool>,
    pub active: Option<bool>,
}

/// Validated track entry
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInput {
    /// Existing track id; its play counter survives an update
    pub id: Option<Uuid>,
    pub title: String,
    pub duration: Option<String>,
    pub audio_file: String,
    pub track_number: i64,
    pub featured: bool,
}

/// Validated release create/update body
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseInput {
    pub title: String,
    pub artist_id: Uuid,
    pub release_type: ReleaseType,
    pub genre: Option<Vec<Genre>>,
    pub description: Option<String>,
    pub artwork: String,
    pub tracks: Vec<TrackInput>,
    pub release_date: DateTime<Utc>,
    /// Trimmed and uppercased
    pub catalog_number: String,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub streaming_links: Option<StreamingLinks>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
    /// Trimmed and lowercased
    pub tags: Option<Vec<String>>,
}

/// Contact form category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactKind {
    #[default]
    General,
    Booking,
    Demo,
    Press,
    Support,
}

impl ContactKind {
    const NAMES: [&'static str; 5] = ["general", "booking", "demo", "press", "support"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::General => "general",
            ContactKind::Booking => "booking",
            ContactKind::Demo => "demo",
            ContactKind::Press => "press",
            ContactKind::Support => "support",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "general" => Some(ContactKind::General),
            "booking" => Some(ContactKind::Booking),
            "demo" => Some(ContactKind::Demo),
            "press" => Some(ContactKind::Press),
            "support" => Some(ContactKind::Support),
            _ => None,
        }
    }
}

/// Validated contact form submission (all text trimmed)
#[derive(Debug, Clone, PartialEq)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub kind: ContactKind,
}

// ========================================
// Rule engine
// ========================================

#[derive(Debug, Clone, Copy)]
struct Text {
    required: bool,
    min: usize,
    max: usize,
    trim: bool,
    allow_empty: bool,
}

impl Text {
    const fn required(min: usize, max: usize) -> Self {
        Text {
            required: true,
            min,
            max,
            trim: true,
            allow_empty: false,
        }
    }

    const fn optional(max: usize) -> Self {
        Text {
            required: false,
            min: 0,
            max,
            trim: false,
            allow_empty: true,
        }
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

fn path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn missing(&mut self, field: &str) {
        self.fail(field, format!("\"{}\" is required", field));
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(self.errors),
        }
    }

    fn text(&mut self, obj: &Map<String, Value>, key: &str, field: &str, rule: Text) -> Option<String> {
        let Some(value) = present(obj, key) else {
            if rule.required {
                self.missing(field);
            }
            return None;
        };
        let Some(raw) = value.as_str() else {
            self.fail(field, format!("\"{}\" must be a string", field));
            return None;
        };
        let s = if rule.trim { raw.trim() } else { raw };
        if s.is_empty() {
            if rule.allow_empty {
                return Some(String::new());
            }
            self.fail(field, format!("\"{}\" is not allowed to be empty", field));
            return None;
        }
        let len = s.chars().count();
        if len < rule.min {
            self.fail(
                field,
                format!("\"{}\" length must be at least {} characters long", field, rule.min),
            );
            return None;
        }
        if len > rule.max {
            self.fail(
                field,
                format!(
                    "\"{}\" length must be less than or equal to {} characters long",
                    field, rule.max
                ),
            );
            return None;
        }
        Some(s.to_string())
    }

    fn boolean(&mut self, obj: &Map<String, Value>, key: &str, field: &str) -> Option<bool> {
        let value = present(obj, key)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.fail(field, format!("\"{}\" must be a boolean", field));
                None
            }
        }
    }

    fn integer(&mut self, obj: &Map<String, Value>, key: &str, field: &str, min: i64) -> Option<i64> {
        let Some(value) = present(obj, key) else {
            self.missing(field);
            return None;
        };
        let Some(n) = value.as_f64() else {
            self.fail(field, format!("\"{}\" must be a number", field));
            return None;
        };
        if n.fract() != 0.0 {
            self.fail(field, format!("\"{}\" must be an integer", field));
            return None;
        }
        if n < min as f64 {
            self.fail(
                field,
                format!("\"{}\" must be greater than or equal to {}", field, min),
            );
            return None;
        }
        Some(n as i64)
    }

    fn price(&mut self, obj: &Map<String, Value>) -> Option<f64> {
        let value = present(obj, "price")?;
        match value.as_f64() {
            Some(n) if n >= 0.0 => Some(n),
            Some(_) => {
                self.fail("price", "\"price\" must be greater than or equal to 0");
                None
            }
            None => {
                self.fail("price", "\"price\" must be a number");
                None
            }
        }
    }

    fn one_of<T>(
        &mut self,
        value: &Value,
        field: &str,
        names: &[&str],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let parsed = value.as_str().and_then(&parse);
        if parsed.is_none() {
            self.fail(
                field,
                format!("\"{}\" must be one of [{}]", field, names.join(", ")),
            );
        }
        parsed
    }

    fn genres(&mut self, obj: &Map<String, Value>) -> Option<Vec<Genre>> {
        let value = present(obj, "genre")?;
        let Some(items) = value.as_array() else {
            self.fail("genre", "\"genre\" must be an array");
            return None;
        };
        let names: Vec<&str> = Genre::ALL.iter().map(|g| g.as_str()).collect();
        let mut genres = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let field = format!("genre.{}", i);
            // Stored lowercase, matched exactly
            if let Some(g) = self.one_of(item, &field, &names, |s| {
                Genre::ALL.into_iter().find(|g| g.as_str() == s)
            }) {
                if !genres.contains(&g) {
                    genres.push(g);
                }
            }
        }
        Some(genres)
    }

    /// Optional URI; `""` is accepted and means "no link"
    fn uri(&mut self, obj: &Map<String, Value>, key: &str, field: &str) -> Option<Option<String>> {
        let s = self.text(obj, key, field, Text::optional(usize::MAX))?;
        if s.is_empty() {
            return Some(None);
        }
        if !URI.is_match(&s) {
            self.fail(field, format!("\"{}\" must be a valid uri", field));
            return None;
        }
        Some(Some(s))
    }

    fn platform_link(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        pattern: &Regex,
        label: &str,
    ) -> Option<String> {
        let field = path("socialLinks", key);
        let link = self.uri(obj, key, &field).flatten()?;
        if !pattern.is_match(&link) {
            self.fail(&field, format!("Invalid {} URL", label));
            return None;
        }
        Some(link)
    }

    fn object<'a>(&mut self, obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
        let value = present(obj, key)?;
        let inner = value.as_object();
        if inner.is_none() {
            self.fail(key, format!("\"{}\" must be of type object", key));
        }
        inner
    }

    fn social_links(&mut self, obj: &Map<String, Value>) -> Option<SocialLinks> {
        let links = self.object(obj, "socialLinks")?;
        Some(SocialLinks {
            instagram: self.platform_link(links, "instagram", &INSTAGRAM, "Instagram"),
            twitter: self.platform_link(links, "twitter", &TWITTER, "Twitter"),
            soundcloud: self.platform_link(links, "soundcloud", &SOUNDCLOUD, "SoundCloud"),
            spotify: self.platform_link(links, "spotify", &SPOTIFY, "Spotify"),
            website: self.platform_link(links, "website", &WEBSITE, "website"),
        })
    }

    fn streaming_links(&mut self, obj: &Map<String, Value>) -> Option<StreamingLinks> {
        let links = self.object(obj, "streamingLinks")?;
        let mut link = |key: &str| self.uri(links, key, &path("streamingLinks", key)).flatten();
        Some(StreamingLinks {
            spotify: link("spotify"),
            apple_music: link("appleMusic"),
            soundcloud: link("soundcloud"),
            bandcamp: link("bandcamp"),
            beatport: link("beatport"),
            youtube: link("youtube"),
        })
    }

    fn track(&mut self, value: &Value, index: usize) -> Option<TrackInput> {
        let prefix = format!("tracks.{}", index);
        let Some(obj) = value.as_object() else {
            self.fail(&prefix, format!("\"{}\" must be of type object", prefix));
            return None;
        };

        let id = match present(obj, "id") {
            Some(v) => {
                let parsed = v.as_str().and_then(|s| Uuid::parse_str(s).ok());
                if parsed.is_none() {
                    let field = path(&prefix, "id");
                    self.fail(&field, format!("\"{}\" must be a valid GUID", field));
                }
                parsed
            }
            None => None,
        };
        let title = self.text(obj, "title", &path(&prefix, "title"), Text::required(1, 200));
        let duration_field = path(&prefix, "duration");
        let rule = Text {
            required: false,
            ..Text::required(0, 5)
        };
        let duration = match self.text(obj, "duration", &duration_field, rule) {
            Some(d) if !DURATION.is_match(&d) => {
                self.fail(&duration_field, "Duration must be in mm:ss format");
                None
            }
            other => other,
        };
        let audio_file = self.text(
            obj,
            "audioFile",
            &path(&prefix, "audioFile"),
            Text::required(1, usize::MAX),
        );
        let track_number = self.integer(obj, "trackNumber", &path(&prefix, "trackNumber"), 1);
        let featured = self.boolean(obj, "featured", &path(&prefix, "featured"));

        Some(TrackInput {
            id,
            title: title?,
            duration,
            audio_file: audio_file?,
            track_number: track_number?,
            featured: featured.unwrap_or(false),
        })
    }
}

fn as_object<'a>(body: &'a Value, checker: &mut Checker) -> Option<&'a Map<String, Value>> {
    let obj = body.as_object();
    if obj.is_none() {
        checker.fail("value", "\"value\" must be of type object");
    }
    obj
}

// ========================================
// Entity validators
// ========================================

/// Validate an artist body
pub fn validate_artist(body: &Value) -> Result<ArtistInput, Vec<FieldError>> {
    let mut c = Checker::default();
    let Some(obj) = as_object(body, &mut c) else {
        return Err(c.errors);
    };

    let name = c.text(obj, "name", "name", Text::required(1, 100));
    if let Some(n) = &name {
        if slugify(n).is_empty() {
            c.fail("name", "\"name\" must contain at least one letter or digit");
        }
    }
    let bio = c.text(obj, "bio", "bio", Text::optional(2000));

    let profile_image = c.text(obj, "profileImage", "profileImage", Text::optional(usize::MAX));
    if let Some(image) = profile_image.as_deref().filter(|s| !s.is_empty()) {
        if !URI.is_match(image) && !image.starts_with("/uploads/") {
            c.fail("profileImage", "\"profileImage\" must be a valid uri");
        }
    }

    let input = ArtistInput {
        name: name.unwrap_or_default(),
        bio,
        profile_image,
        genre: c.genres(obj),
        social_links: c.social_links(obj),
        featured: c.boolean(obj, "featured", "featured"),
        active: c.boolean(obj, "active", "active"),
    };
    c.finish(Some(input))
}

/// Validate a release body
pub fn validate_release(body: &Value) -> Result<ReleaseInput, Vec<FieldError>> {
    let mut c = Checker::default();
    let Some(obj) = as_object(body, &mut c) else {
        return Err(c.errors);
    };

    let title = c.text(obj, "title", "title", Text::required(1, 200));

    let artist_id = match c.text(obj, "artist", "artist", Text::required(1, 64)) {
        Some(raw) => {
            let parsed = Uuid::parse_str(&raw).ok();
            if parsed.is_none() {
                c.fail("artist", "\"artist\" must be a valid GUID");
            }
            parsed
        }
        None => None,
    };

    let release_type = match present(obj, "releaseType") {
        Some(v) => c.one_of(
            v,
            "releaseType",
            &["single", "ep", "album", "compilation", "remix"],
            |s| s.parse::<ReleaseType>().ok().filter(|t| t.as_str() == s),
        ),
        None => {
            c.missing("releaseType");
            None
        }
    };

    let genre = c.genres(obj);
    let description = c.text(obj, "description", "description", Text::optional(1000));
    let artwork = c.text(obj, "artwork", "artwork", Text::required(1, usize::MAX));

    let tracks = match present(obj, "tracks") {
        Some(Value::Array(items)) if items.is_empty() => {
            c.fail("tracks", "\"tracks\" must contain at least 1 items");
            None
        }
        Some(Value::Array(items)) => {
            let mut seen = HashSet::new();
            let mut parsed = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let track = c.track(item, i);
                if let Some(id) = track.as_ref().and_then(|t| t.id) {
                    if !seen.insert(id) {
                        let field = format!("tracks.{}.id", i);
                        c.fail(&field, format!("\"{}\" contains a duplicate value", field));
                    }
                }
                parsed.push(track);
            }
            parsed.into_iter().collect::<Option<Vec<_>>>()
        }
        Some(_) => {
            c.fail("tracks", "\"tracks\" must be an array");
            None
        }
        None => {
            c.missing("tracks");
            None
        }
    };

    let release_date = match present(obj, "releaseDate") {
        Some(v) => {
            let parsed = v.as_str().and_then(parse_user_date);
            if parsed.is_none() {
                c.fail("releaseDate", "\"releaseDate\" must be a valid date");
            }
            parsed
        }
        None => {
            c.missing("releaseDate");
            None
        }
    };

    let catalog_number = c
        .text(obj, "catalogNumber", "catalogNumber", Text::required(1, 20))
        .map(|s| s.to_uppercase());

    let price = c.price(obj);
    let currency = present(obj, "currency").and_then(|v| {
        c.one_of(v, "currency", &["USD", "EUR", "GBP"], |s| {
            s.parse::<Currency>().ok().filter(|cur| cur.as_str() == s)
        })
    });
    let streaming_links = c.streaming_links(obj);
    let featured = c.boolean(obj, "featured", "featured");
    let published = c.boolean(obj, "published", "published");

    let tags = match present(obj, "tags") {
        Some(Value::Array(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let field = format!("tags.{}", i);
                let holder: Map<String, Value> =
                    std::iter::once(("tag".to_string(), item.clone())).collect();
                if let Some(tag) = c.text(&holder, "tag", &field, Text::required(1, usize::MAX)) {
                    tags.push(tag.to_lowercase());
                }
            }
            Some(tags)
        }
        Some(_) => {
            c.fail("tags", "\"tags\" must be an array");
            None
        }
        None => None,
    };

    let input = (|| {
        Some(ReleaseInput {
            title: title?,
            artist_id: artist_id?,
            release_type: release_type?,
            genre,
            description,
            artwork: artwork?,
            tracks: tracks?,
            release_date: release_date?,
            catalog_number: catalog_number?,
            price,
            currency,
            streaming_links,
            featured,
            published,
            tags,
        })
    })();
    c.finish(input)
}

/// Validate a contact form body
pub fn validate_contact(body: &Value) -> Result<ContactInput, Vec<FieldError>> {
    let mut c = Checker::default();
    let Some(obj) = as_object(body, &mut c) else {
        return Err(c.errors);
    };

    let name = c.text(obj, "name", "name", Text::required(2, 100));
    let email = match c.text(obj, "email", "email", Text::required(1, 254)) {
        Some(e) if !EMAIL.is_match(&e) => {
            c.fail("email", "\"email\" must be a valid email");
            None
        }
        other => other,
    };
    let subject = c.text(obj, "subject", "subject", Text::required(5, 200));
    let message = c.text(obj, "message", "message", Text::required(10, 2000));
    let kind = match present(obj, "type") {
        Some(v) => c.one_of(v, "type", &ContactKind::NAMES, ContactKind::parse),
        None => Some(ContactKind::General),
    };

    let input = (|| {
        Some(ContactInput {
            name: name?,
            email: email?,
            subject: subject?,
            message: message?,
            kind: kind?,
        })
    })();
    c.finish(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    fn release_body() -> Value {
        json!({
            "title": "  Night Drive ",
            "artist": Uuid::new_v4().to_string(),
            "releaseType": "ep",
            "genre": ["techno", "house"],
            "artwork": "/uploads/artwork/night.png",
            "tracks": [
                {"title": "Intro", "duration": "3:45", "audioFile": "/uploads/audio/intro.mp3", "trackNumber": 1}
            ],
            "releaseDate": "2024-05-01",
            "catalogNumber": " exm042 ",
            "tags": [" Dark ", "WAREHOUSE"]
        })
    }

    #[test]
    fn test_artist_minimal_body() {
        let input = validate_artist(&json!({"name": "  Test Artist  "})).unwrap();
        assert_eq!(input.name, "Test Artist");
        assert!(input.genre.is_none());
        assert!(input.featured.is_none());
    }

    #[test]
    fn test_artist_collects_all_errors() {
        let errors = validate_artist(&json!({
            "name": "",
            "bio": "x".repeat(2001),
            "genre": ["techno", "polka"],
            "socialLinks": {"instagram": "https://facebook.com/someone"},
            "featured": "yes"
        }))
        .unwrap_err();

        let f = fields(&errors);
        assert!(f.contains(&"name"));
        assert!(f.contains(&"bio"));
        assert!(f.contains(&"genre.1"));
        assert!(f.contains(&"socialLinks.instagram"));
        assert!(f.contains(&"featured"));
    }

    #[test]
    fn test_artist_name_without_slug_characters_rejected() {
        let errors = validate_artist(&json!({"name": "!!!"})).unwrap_err();
        assert_eq!(fields(&errors), vec!["name"]);
    }

    #[test]
    fn test_artist_profile_image_accepts_upload_path() {
        assert!(validate_artist(&json!({"name": "A", "profileImage": "/uploads/artwork/a.png"})).is_ok());
        assert!(validate_artist(&json!({"name": "A", "profileImage": "https://cdn.example.com/a.png"})).is_ok());
        assert!(validate_artist(&json!({"name": "A", "profileImage": "not a url"})).is_err());
    }

    #[test]
    fn test_social_links_platform_rules() {
        let ok = validate_artist(&json!({
            "name": "A",
            "socialLinks": {
                "instagram": "https://www.instagram.com/a",
                "spotify": "https://open.spotify.com/artist/1",
                "website": ""
            }
        }))
        .unwrap();
        let links = ok.social_links.unwrap();
        assert!(links.instagram.is_some());
        assert!(links.website.is_none());

        let errors = validate_artist(&json!({
            "name": "A",
            "socialLinks": {"twitter": "https://x.com/a"}
        }))
        .unwrap_err();
        assert_eq!(errors[0].message, "Invalid Twitter URL");
    }

    #[test]
    fn test_release_normalization() {
        let input = validate_release(&release_body()).unwrap();
        assert_eq!(input.title, "Night Drive");
        assert_eq!(input.catalog_number, "EXM042");
        assert_eq!(input.tags.unwrap(), vec!["dark".to_string(), "warehouse".to_string()]);
        assert_eq!(input.release_type, ReleaseType::Ep);
        assert_eq!(input.tracks.len(), 1);
        assert!(input.price.is_none());
    }

    #[test]
    fn test_release_requires_tracks() {
        let mut body = release_body();
        body["tracks"] = json!([]);
        let errors = validate_release(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["tracks"]);
    }

    #[test]
    fn test_release_track_errors_have_paths() {
        let mut body = release_body();
        body["tracks"] = json!([
            {"title": "Ok", "audioFile": "a.mp3", "trackNumber": 1},
            {"title": "", "duration": "345", "trackNumber": 0}
        ]);
        let errors = validate_release(&body).unwrap_err();
        let f = fields(&errors);
        assert!(f.contains(&"tracks.1.title"));
        assert!(f.contains(&"tracks.1.duration"));
        assert!(f.contains(&"tracks.1.audioFile"));
        assert!(f.contains(&"tracks.1.trackNumber"));
        assert!(!f.iter().any(|p| p.starts_with("tracks.0")));
    }

    #[test]
    fn test_track_duration_is_optional() {
        let mut body = release_body();
        body["tracks"] = json!([{"title": "Ok", "audioFile": "a.mp3", "trackNumber": 1}]);
        let input = validate_release(&body).unwrap();
        assert!(input.tracks[0].duration.is_none());

        body["tracks"][0]["duration"] = json!("4m");
        let errors = validate_release(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["tracks.0.duration"]);
    }

    #[test]
    fn test_duplicate_track_ids_rejected() {
        let id = Uuid::new_v4().to_string();
        let mut body = release_body();
        body["tracks"] = json!([
            {"id": id, "title": "A", "audioFile": "a.mp3", "trackNumber": 1},
            {"id": id, "title": "B", "audioFile": "b.mp3", "trackNumber": 2}
        ]);
        let errors = validate_release(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["tracks.1.id"]);
    }

    #[test]
    fn test_release_field_rules() {
        let mut body = release_body();
        body["artist"] = json!("64b7f0c2e1a2b3c4d5e6f7a8");
        body["releaseType"] = json!("mixtape");
        body["catalogNumber"] = json!("X".repeat(21));
        body["price"] = json!(-1);
        body["currency"] = json!("JPY");
        body["releaseDate"] = json!("soon");
        body["streamingLinks"] = json!({"appleMusic": "music.apple.com"});

        let errors = validate_release(&body).unwrap_err();
        let f = fields(&errors);
        for expected in [
            "artist",
            "releaseType",
            "catalogNumber",
            "price",
            "currency",
            "releaseDate",
            "streamingLinks.appleMusic",
        ] {
            assert!(f.contains(&expected), "missing error for {}", expected);
        }
    }

    #[test]
    fn test_contact_defaults_and_trimming() {
        let input = validate_contact(&json!({
            "name": " Jo ",
            "email": "jo@example.com",
            "subject": "Booking request",
            "message": "  Can you play our party?  "
        }))
        .unwrap();
        assert_eq!(input.name, "Jo");
        assert_eq!(input.message, "Can you play our party?");
        assert_eq!(input.kind, ContactKind::General);
    }

    #[test]
    fn test_contact_short_message() {
        let errors = validate_contact(&json!({
            "name": "Jo",
            "email": "jo@example.com",
            "subject": "Hello there",
            "message": "too short"
        }))
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["message"]);
        assert!(errors[0].message.contains("at least 10"));
    }

    #[test]
    fn test_contact_bad_email_and_type() {
        let errors = validate_contact(&json!({
            "name": "Jo",
            "email": "jo at example",
            "subject": "Hello there",
            "message": "A long enough message",
            "type": "complaint"
        }))
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["email", "type"]);
    }

    #[test]
    fn test_non_object_body() {
        assert!(validate_contact(&json!([1, 2])).is_err());
    }
}
