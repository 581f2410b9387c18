// src/models/pagination.rs

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort direction parsed from `sortDir`. Anything but `asc` sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Query parameters shared by every list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    /// Role filter (users only).
    pub role: Option<String>,
    /// Category title filter (tests only).
    pub category: Option<String>,
}

impl ListParams {
    /// Page number, 1-based.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit, DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page(), self.limit())
    }

    /// Trimmed search term, `None` when blank.
    pub fn search(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    /// `%term%` pattern for ILIKE matching. `%` and `_` in the term match
    /// literally.
    pub fn search_pattern(&self) -> Option<String> {
        self.search().map(|s| format!("%{}%", escape_like(s)))
    }

    pub fn sort_by(&self) -> Option<&str> {
        non_blank(self.sort_by.as_deref())
    }

    pub fn sort_dir(&self) -> SortDir {
        match self.sort_dir.as_deref().map(|d| d.trim().to_ascii_lowercase()) {
            Some(d) if d == "asc" => SortDir::Asc,
            _ => SortDir::Desc,
        }
    }

    /// Category title filter; `All` means no filter.
    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref()).filter(|c| *c != "All")
    }
}

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// Row offset of a 1-based page. Saturates for absurdly large pages.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit)
}

/// Escapes LIKE metacharacters using the default `\` escape.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Paginated list response.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page(),
            limit: params.limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped() {
        let mut params = ListParams::default();
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);

        params.limit = Some(500);
        assert_eq!(params.limit(), 100);

        params.limit = Some(0);
        assert_eq!(params.limit(), 1);

        params.limit = Some(-7);
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_page_and_offset() {
        let params = ListParams {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(params.offset(), 40);

        let negative = ListParams {
            page: Some(-2),
            ..Default::default()
        };
        assert_eq!(negative.page(), 1);
        assert_eq!(negative.offset(), 0);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let params = ListParams {
            page: Some(i64::MAX),
            limit: Some(100),
            ..Default::default()
        };
        assert_eq!(params.offset(), i64::MAX);
        assert_eq!(page_offset(i64::MAX, 12), i64::MAX);
        assert_eq!(page_offset(2, 12), 12);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let params = ListParams {
            search: Some(r"50%_off\".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_pattern().as_deref(), Some(r"%50\%\_off\\%"));

        let underscore = ListParams {
            search: Some("_".to_string()),
            ..Default::default()
        };
        assert_eq!(underscore.search_pattern().as_deref(), Some(r"%\_%"));
    }

    #[test]
    fn test_search_and_sort_dir() {
        let params = ListParams {
            search: Some("  rust ".to_string()),
            sort_dir: Some("ASC".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_pattern().as_deref(), Some("%rust%"));
        assert_eq!(params.sort_dir(), SortDir::Asc);

        let blank = ListParams {
            search: Some("   ".to_string()),
            sort_dir: Some("sideways".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.search(), None);
        assert_eq!(blank.sort_dir(), SortDir::Desc);
    }

    #[test]
    fn test_category_all_means_unfiltered() {
        let params = ListParams {
            category: Some("All".to_string()),
            ..Default::default()
        };
        assert_eq!(params.category(), None);
    }

    #[test]
    fn test_query_string_uses_camel_case() {
        let params: ListParams = serde_json::from_str(r#"{"sortBy": "level", "sortDir": "asc"}"#).unwrap();
        assert_eq!(params.sort_by(), Some("level"));
        assert_eq!(params.sort_dir(), SortDir::Asc);
    }
}
