//! Offset pagination for lead listings.

use serde::{Deserialize, Serialize};

/// Page size used when the caller passes a non-positive limit.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a single call may return.
pub const MAX_PAGE_SIZE: usize = 100;

/// A clamped `(limit, offset)` pair.
///
/// Construction is the only place clamping happens, so every backend sees
/// the same bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    limit: usize,
    offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Clamps raw caller input.
    ///
    /// A non-positive `limit` becomes [`DEFAULT_PAGE_SIZE`], a larger one is
    /// capped at [`MAX_PAGE_SIZE`]; a negative `offset` becomes zero.
    ///
    /// ```
    /// use siteforge_persistence::types::Pagination;
    ///
    /// assert_eq!(Pagination::new(500, -3).limit(), 100);
    /// assert_eq!(Pagination::new(0, 10).limit(), 20);
    /// assert_eq!(Pagination::new(10, -3).offset(), 0);
    /// ```
    pub fn new(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            usize::try_from(limit).map_or(MAX_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE))
        };
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        Self { limit, offset }
    }

    /// Number of records to return, in `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of records to skip.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Applies the window to an already ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}
