//! Page windows and list metadata for member listings.
//!
//! The window is always ordered by creation time, newest first. `total` is
//! computed by a separate count over the same search filter, so it can be
//! stale relative to the page under concurrent writes.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Query string of the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, code = "min"))]
    pub page: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, code = "min"))]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
        }
    }
}

/// A validated slice of the ordered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
    pub search: Option<String>,
}

impl PageWindow {
    /// Callers are expected to have validated `page >= 1` and `limit >= 1`;
    /// anything smaller is clamped to 1.
    pub fn from_query(query: &ListQuery) -> Self {
        let page = query.page.max(1) as u64;
        let limit = query.limit.max(1) as u64;
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
            search,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name_matches(self.search.as_deref(), name)
    }
}

/// Case-insensitive substring match on the member name. No term matches all.
pub fn name_matches(search: Option<&str>, name: &str) -> bool {
    match search {
        Some(term) => name.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl PageMeta {
    pub fn new(total: u64, window: &PageWindow) -> Self {
        Self {
            total,
            total_pages: total.div_ceil(window.limit),
            current_page: window.page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: i64, limit: i64, search: Option<&str>) -> ListQuery {
        ListQuery {
            page,
            limit,
            search: search.map(str::to_string),
        }
    }

    #[test]
    fn test_first_page_has_zero_offset() {
        let window = PageWindow::from_query(&ListQuery::default());
        assert_eq!(window.page, 1);
        assert_eq!(window.limit, 10);
        assert_eq!(window.offset, 0);
        assert_eq!(window.search, None);
    }

    #[test]
    fn test_offset_is_page_minus_one_times_limit() {
        let window = PageWindow::from_query(&query(3, 7, None));
        assert_eq!(window.offset, 14);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let window = PageWindow::from_query(&query(1, 10, Some("   ")));
        assert_eq!(window.search, None);
        assert!(window.matches("anything"));
    }

    #[test]
    fn test_search_matches_substring_case_insensitively() {
        let window = PageWindow::from_query(&query(1, 10, Some("an")));
        assert!(window.matches("Ann"));
        assert!(window.matches("JOANNA"));
        assert!(!window.matches("Bob"));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let window = PageWindow::from_query(&query(1, 10, None));
        assert_eq!(PageMeta::new(0, &window).total_pages, 0);
        assert_eq!(PageMeta::new(10, &window).total_pages, 1);
        assert_eq!(PageMeta::new(11, &window).total_pages, 2);
    }

    #[test]
    fn test_meta_serializes_in_camel_case() {
        let window = PageWindow::from_query(&query(2, 5, None));
        let json = serde_json::to_value(PageMeta::new(12, &window)).unwrap();
        assert_eq!(json["total"], 12);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["currentPage"], 2);
    }

    #[test]
    fn test_non_positive_values_fail_validation() {
        let errors = query(0, 0, None).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("page"));
        assert!(fields.contains_key("limit"));
        assert!(query(1, 1, None).validate().is_ok());
    }
}
