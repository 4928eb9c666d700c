use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Pagination query parameters, 1-based.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Clamp to sane bounds and return (limit, offset).
    pub fn bounds(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (limit, (page - 1) * limit)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        Self {
            items,
            page: query.page(),
            limit: query.limit(),
            total,
        }
    }

    /// Map item type while keeping paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_defaults() {
        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(q.bounds(), (DEFAULT_LIMIT, 0));
    }

    #[test]
    fn test_bounds_clamps_limit() {
        let q = PageQuery {
            page: Some(2),
            limit: Some(10_000),
        };
        assert_eq!(q.bounds(), (MAX_LIMIT, MAX_LIMIT));
    }

    #[test]
    fn test_bounds_rejects_zero_page() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(10),
        };
        assert_eq!(q.bounds(), (10, 0));
    }
}
