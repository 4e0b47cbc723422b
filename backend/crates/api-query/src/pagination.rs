//! Page window computation.

use crate::error::QueryError;

/// Page used when none (or an invalid one) is requested.
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_LIMIT: u64 = 100;

/// One-based page window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
    page_requested: bool,
}

impl Pagination {
    /// Build a window from raw `page` and `limit` parameters.
    ///
    /// Missing, non-numeric or zero values fall back to [`DEFAULT_PAGE`] and
    /// [`DEFAULT_LIMIT`].
    ///
    /// # Examples
    /// ```
    /// use api_query::Pagination;
    ///
    /// let window = Pagination::from_raw(Some("3"), Some("10"));
    /// assert_eq!(window.skip(), 20);
    /// assert_eq!(window.limit(), 10);
    /// ```
    #[must_use]
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let requested_page = page.and_then(parse_positive);
        Self {
            page: requested_page.unwrap_or(DEFAULT_PAGE),
            limit: limit.and_then(parse_positive).unwrap_or(DEFAULT_LIMIT),
            page_requested: requested_page.is_some(),
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Maximum number of records on the page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of records preceding the page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Reject pages that start past the end of `total` matching records.
    ///
    /// Only an explicitly requested page beyond the first can fail; an empty
    /// result set on the first page is a valid, empty listing.
    ///
    /// # Errors
    /// Returns [`QueryError::PageNotFound`] when the page offset is at or past
    /// `total`.
    pub fn ensure_within(&self, total: u64) -> Result<(), QueryError> {
        if self.page_requested && self.page > 1 && self.skip() >= total {
            return Err(QueryError::PageNotFound {
                page: self.page,
                total,
            });
        }
        Ok(())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_raw(None, None)
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|value| *value > 0)
}
