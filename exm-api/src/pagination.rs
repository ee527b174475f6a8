//! Pagination utilities
//!
//! Page-based pagination over LIMIT/OFFSET queries. Requested pages beyond
//! the last one are NOT clamped: they yield an empty page with correct
//! metadata.

use exm_common::api::types::PaginationMeta;

/// Upper bound for any requested page size
pub const MAX_LIMIT: u32 = 100;

/// Sanitized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: u32,
    /// Page size, 1..=MAX_LIMIT
    pub limit: u32,
}

impl PageRequest {
    /// Parse raw query values
    ///
    /// Missing or unparsable values fall back to page 1 / `default_limit`;
    /// the limit is clamped to `1..=MAX_LIMIT`.
    ///
    /// # Examples
    /// ```
    /// use exm_api::pagination::PageRequest;
    ///
    /// let p = PageRequest::from_query(Some("2"), Some("500"), 10);
    /// assert_eq!((p.page, p.limit), (2, 100));
    ///
    /// let p = PageRequest::from_query(Some("abc"), None, 12);
    /// assert_eq!((p.page, p.limit), (1, 12));
    /// ```
    pub fn from_query(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .map(|l| l.clamp(1, MAX_LIMIT as i64) as u32)
            .unwrap_or(default_limit);

        PageRequest { page, limit }
    }

    /// Offset for SQL LIMIT/OFFSET query
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Calculate pagination metadata from total results and the request
///
/// # Examples
/// ```
/// use exm_api::pagination::{calculate_pagination, PageRequest};
///
/// let meta = calculate_pagination(12, PageRequest { page: 2, limit: 5 });
/// assert_eq!(meta.pages, 3);
/// assert!(meta.has_next && meta.has_prev);
/// ```
pub fn calculate_pagination(total: u64, request: PageRequest) -> PaginationMeta {
    let limit = request.limit.max(1) as u64;
    let pages = total.div_ceil(limit) as u32;

    PaginationMeta {
        page: request.page,
        pages,
        total,
        limit: request.limit,
        has_next: request.page < pages,
        has_prev: request.page > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: u32, limit: u32) -> PageRequest {
        PageRequest { page, limit }
    }

    #[test]
    fn test_pagination_middle_page() {
        let p = calculate_pagination(12, req(2, 5));
        assert_eq!(p.page, 2);
        assert_eq!(p.pages, 3);
        assert_eq!(p.total, 12);
        assert!(p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_pagination_first_page() {
        let p = calculate_pagination(150, req(1, 100));
        assert_eq!(p.pages, 2);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = calculate_pagination(250, req(3, 100));
        assert_eq!(p.pages, 3);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_pagination_out_of_bounds_not_clamped() {
        let p = calculate_pagination(150, req(99, 100));
        assert_eq!(p.page, 99);
        assert_eq!(p.pages, 2);
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(req(99, 100).offset(), 9800);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, req(1, 10));
        assert_eq!(p.pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(200, req(2, 100));
        assert_eq!(p.pages, 2);
        assert!(!p.has_next);
    }

    #[test]
    fn test_request_parsing() {
        assert_eq!(PageRequest::from_query(None, None, 10), req(1, 10));
        assert_eq!(PageRequest::from_query(Some("0"), Some("0"), 10), req(1, 1));
        assert_eq!(PageRequest::from_query(Some("-3"), Some("-5"), 12), req(1, 1));
        assert_eq!(PageRequest::from_query(Some(" 4 "), Some("25"), 12), req(4, 25));
        assert_eq!(req(3, 5).offset(), 10);
    }
}
