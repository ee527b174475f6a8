//! WHERE clause construction
//!
//! Every builder starts from `... WHERE 1 = 1` and appends `AND` terms with
//! bound parameters. Artists are aliased `a`, releases `r`.

use sqlx::{QueryBuilder, Sqlite};

use super::params::{ArtistFilter, ArtistStatus, ReleaseFilter, ReleaseStatus};

/// `%term%` with LIKE metacharacters escaped by `\`
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_genres(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, genres: &[String]) {
    if genres.is_empty() {
        return;
    }
    qb.push(format!(
        " AND EXISTS (SELECT 1 FROM json_each({}) g WHERE g.value IN (",
        column
    ));
    let mut values = qb.separated(", ");
    for genre in genres {
        values.push_bind(genre.clone());
    }
    values.push_unseparated("))");
}

pub(crate) fn push_artist_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ArtistFilter) {
    match filter.status {
        ArtistStatus::Active => {
            qb.push(" AND a.active = 1");
        }
        ArtistStatus::Inactive => {
            qb.push(" AND a.active = 0");
        }
        ArtistStatus::All => {}
    }

    push_genres(qb, "a.genres", &filter.genres);

    if filter.featured_only {
        qb.push(" AND a.featured = 1");
    }

    if !filter.search_terms.is_empty() {
        qb.push(" AND (");
        for (i, term) in filter.search_terms.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            let pattern = like_pattern(term);
            qb.push("a.name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR COALESCE(a.bio, '') LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
}

pub(crate) fn push_release_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ReleaseFilter) {
    match filter.status {
        ReleaseStatus::Published => {
            qb.push(" AND r.published = 1");
        }
        ReleaseStatus::Unpublished => {
            qb.push(" AND r.published = 0");
        }
        ReleaseStatus::All => {}
    }

    push_genres(qb, "r.genres", &filter.genres);

    if let Some(artist_id) = &filter.artist_id {
        qb.push(" AND r.artist_id = ").push_bind(artist_id.clone());
    }

    if let Some(release_type) = &filter.release_type {
        qb.push(" AND r.release_type = ").push_bind(release_type.clone());
    }

    if filter.featured_only {
        qb.push(" AND r.featured = 1");
    }

    if !filter.search_terms.is_empty() {
        qb.push(" AND (");
        for (i, term) in filter.search_terms.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            let pattern = like_pattern(term);
            qb.push("r.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR COALESCE(r.description, '') LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM tracks t WHERE t.release_id = r.id AND t.title LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(")");
    }
}
