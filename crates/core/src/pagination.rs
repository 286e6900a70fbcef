//! Page/limit normalization and page-count arithmetic.

use serde::{Deserialize, Serialize};

/// A normalized page request.
///
/// Pages are 1-based. Missing values fall back to page 1 and
/// [`PageRequest::DEFAULT_LIMIT`] items; out-of-range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// Pagination metadata for a result set of `total` rows.
    #[must_use]
    pub fn paginate(&self, total: u64) -> Pagination {
        Pagination {
            total,
            pages: page_count(total, self.limit),
            current_page: self.page,
            per_page: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub pages: u64,
    pub current_page: u32,
    pub per_page: u32,
}

/// `ceil(total / limit)`; zero rows means zero pages.
#[must_use]
pub fn page_count(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}
