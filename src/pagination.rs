/// Pagination parsing and response envelope
///
/// Page parameters arrive as untrusted query strings and are parsed into
/// range-checked integers; malformed or out-of-range input is rejected
/// rather than silently defaulted.
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Validated pagination inputs
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Parse `page` and `limit` query values. Missing values fall back to
    /// defaults; present but malformed values are an error.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> ApiResult<Self> {
        let page = match page {
            None => 1,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ApiError::Validation("page must be an integer".to_string()))?,
        };
        if page < 1 {
            return Err(ApiError::Validation("page must be >= 1".to_string()));
        }

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ApiError::Validation("limit must be an integer".to_string()))?,
        };
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ApiError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total_count: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + pagination.limit - 1) / pagination.limit
        };

        Self {
            items,
            current_page: pagination.page,
            total_pages,
            total_count,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let p = Pagination::from_params(None, None).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_explicit_values() {
        let p = Pagination::from_params(Some("3"), Some("25")).unwrap();
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 25);
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(Pagination::from_params(Some("abc"), None).is_err());
        assert!(Pagination::from_params(None, Some("1.5")).is_err());
        assert!(Pagination::from_params(Some("0"), None).is_err());
        assert!(Pagination::from_params(None, Some("0")).is_err());
        assert!(Pagination::from_params(None, Some("101")).is_err());
    }

    #[test]
    fn test_total_pages_arithmetic() {
        let p = Pagination { page: 1, limit: 10 };
        assert_eq!(Paginated::<i32>::new(vec![], p, 0).total_pages, 0);
        assert_eq!(Paginated::<i32>::new(vec![], p, 1).total_pages, 1);
        assert_eq!(Paginated::<i32>::new(vec![], p, 10).total_pages, 1);
        assert_eq!(Paginated::<i32>::new(vec![], p, 11).total_pages, 2);
    }

    #[test]
    fn test_boundary_flags() {
        let first = Paginated::<i32>::new(vec![], Pagination { page: 1, limit: 10 }, 35);
        assert!(!first.has_prev);
        assert!(first.has_next);

        let middle = Paginated::<i32>::new(vec![], Pagination { page: 2, limit: 10 }, 35);
        assert!(middle.has_prev);
        assert!(middle.has_next);

        let last = Paginated::<i32>::new(vec![], Pagination { page: 4, limit: 10 }, 35);
        assert!(last.has_prev);
        assert!(!last.has_next);
    }
}
