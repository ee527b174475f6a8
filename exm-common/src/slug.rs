//! Slug derivation
//!
//! A slug is the lowercase ASCII-alphanumeric form of a name with every
//! other run of characters collapsed into a single `-`, and no leading or
//! trailing hyphen.

/// Derive a slug from a display name
///
/// # Examples
/// ```
/// use exm_common::slug::slugify;
///
/// assert_eq!(slugify("Test Artist"), "test-artist");
/// assert_eq!(slugify("Test Artist!!"), "test-artist");
/// assert_eq!(slugify("  DJ  Nørd  "), "dj-n-rd");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Base slug for a release: artist name followed by release title
pub fn release_slug_base(artist_name: &str, title: &str) -> String {
    slugify(&format!("{}-{}", artist_name, title))
}

/// Slug candidate for the n-th collision (`base-n`), n >= 1
pub fn with_suffix(base: &str, n: u32) -> String {
    format!("{}-{}", base, n)
}
