/**
 * Routes Module
 * API route handlers
 */
use serde::{Deserialize, Serialize};

pub mod auth;
pub mod blog;
pub mod calculators;
pub mod categories;
pub mod contact;
pub mod health;
pub mod leads;
pub mod rss;

pub use crate::error::ErrorResponse;

/// Largest page a list endpoint will return.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Success response (for delete)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Highest page a list endpoint will serve; past it every page is empty.
pub const MAX_PAGE: i64 = 1_000_000;

/// Clamp a requested page/page size; returns (page, page_size, offset).
pub fn paginate(page: i64, page_size: i64) -> (i64, i64, i64) {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let page = page.clamp(1, MAX_PAGE);
    (page, page_size, (page - 1).saturating_mul(page_size))
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_page_size() -> i64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_clamps_inputs() {
        assert_eq!(paginate(1, 10), (1, 10, 0));
        assert_eq!(paginate(3, 20), (3, 20, 40));
        assert_eq!(paginate(0, 0), (1, 1, 0));
        assert_eq!(paginate(-5, 500), (1, MAX_PAGE_SIZE, 0));
    }

    #[test]
    fn test_paginate_huge_page_does_not_overflow() {
        let (page, page_size, offset) = paginate(i64::MAX, 100);
        assert_eq!(page, MAX_PAGE);
        assert_eq!(page_size, 100);
        assert_eq!(offset, (MAX_PAGE - 1) * 100);
        assert!(offset >= 0);

        let (_, _, offset) = paginate(i64::MAX, i64::MAX);
        assert!(offset >= 0);
    }
}
