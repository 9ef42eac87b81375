use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 25;
pub const MAX_LIMIT: u32 = 100;

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// `?page=&limit=` query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Pagination {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Number of rows to skip. Only meaningful once the value passed validation.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: u64) -> Self {
        Self {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total,
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omitted_values_use_defaults() {
        let p: Pagination = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 25 });
        assert!(p.validate().is_ok());
    }

    #[test]
    fn limit_above_max_rejected() {
        let p: Pagination = serde_json::from_value(json!({ "limit": 150 })).unwrap();
        assert!(p.validate().is_err());
        let p: Pagination = serde_json::from_value(json!({ "limit": 100 })).unwrap();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn page_zero_rejected() {
        let p = Pagination { page: 0, limit: 10 };
        assert!(p.validate().is_err());
    }

    #[test]
    fn offset_and_has_next() {
        let p = Pagination { page: 3, limit: 25 };
        assert_eq!(p.offset(), 50);
        let page: Page<u8> = Page::new(vec![], p, 76);
        assert!(page.has_next());
        let page: Page<u8> = Page::new(vec![], p, 75);
        assert!(!page.has_next());
    }
}
