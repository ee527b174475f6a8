//! Sort specifications
//!
//! A request's `sort` value is a single field name, optionally prefixed
//! `-` for descending. Built-in defaults may chain several keys separated
//! by spaces (`-totalPlays -createdAt`). camelCase API field names resolve
//! to columns; unknown fields are a store-level error.

use exm_common::{Error, Result};

/// Which table a sort applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTarget {
    Artists,
    Releases,
}

impl SortTarget {
    fn column(&self, field: &str) -> Option<&'static str> {
        match self {
            SortTarget::Artists => match field {
                "name" => Some("a.name"),
                "slug" => Some("a.slug"),
                "createdAt" => Some("a.created_at"),
                "updatedAt" => Some("a.updated_at"),
                "joinedDate" => Some("a.joined_date"),
                "totalPlays" => Some("a.total_plays"),
                "totalReleases" => Some("a.total_releases"),
                "featured" => Some("a.featured"),
                _ => None,
            },
            SortTarget::Releases => match field {
                "title" => Some("r.title"),
                "slug" => Some("r.slug"),
                "releaseDate" => Some("r.release_date"),
                "createdAt" => Some("r.created_at"),
                "updatedAt" => Some("r.updated_at"),
                "totalPlays" => Some("r.total_plays"),
                "totalDownloads" => Some("r.total_downloads"),
                "price" => Some("r.price"),
                "catalogNumber" => Some("r.catalog_number"),
                "releaseType" => Some("r.release_type"),
                "featured" => Some("r.featured"),
                _ => None,
            },
        }
    }

    fn rowid(&self) -> &'static str {
        match self {
            SortTarget::Artists => "a.rowid",
            SortTarget::Releases => "r.rowid",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// Ordered list of sort keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortKey {
    fn parse(token: &str) -> SortKey {
        match token.strip_prefix('-') {
            Some(field) => SortKey {
                field: field.to_string(),
                descending: true,
            },
            None => SortKey {
                field: token.to_string(),
                descending: false,
            },
        }
    }
}

impl SortSpec {
    /// Resolve a request's sort value; blank input falls back to `default`
    ///
    /// The request value is taken as one key, so `"name,-createdAt"` names
    /// a field that does not exist.
    ///
    /// # Examples
    /// ```
    /// use exm_api::catalog::sort::SortSpec;
    ///
    /// let spec = SortSpec::parse(Some("-totalPlays"), "-createdAt");
    /// assert_eq!(spec.keys().len(), 1);
    /// assert!(spec.keys()[0].descending);
    ///
    /// let spec = SortSpec::parse(None, "-releaseDate -totalPlays");
    /// assert_eq!(spec.keys().len(), 2);
    /// ```
    pub fn parse(raw: Option<&str>, default: &str) -> SortSpec {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(requested) => SortSpec {
                keys: vec![SortKey::parse(requested)],
            },
            None => SortSpec {
                keys: default.split_whitespace().map(SortKey::parse).collect(),
            },
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Render an `ORDER BY` body; insertion order breaks ties
    pub fn order_by(&self, target: SortTarget) -> Result<String> {
        let mut parts = Vec::with_capacity(self.keys.len() + 1);
        for key in &self.keys {
            let column = target
                .column(&key.field)
                .ok_or_else(|| Error::Query(format!("Cannot sort by unknown field '{}'", key.field)))?;
            parts.push(format!("{} {}", column, if key.descending { "DESC" } else { "ASC" }));
        }
        parts.push(format!("{} ASC", target.rowid()));
        Ok(parts.join(", "))
    }
}
