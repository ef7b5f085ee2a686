//! Paged result envelope
//!
//! [`PagedResult`] is the uniform shape every paginated listing returns:
//!
//! ```json
//! { "data": [...], "page": 1, "limit": 10, "total": 42, "totalPages": 5 }
//! ```
//!
//! `total` always counts every row matching the filter, independent of the
//! window; `limit` is the effective page size (the requested one, or `total`
//! when the request was unpaged).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::pagination::PageWindow;

/// How `totalPages` is derived for unpaged requests
///
/// Paged requests always report `ceil(total / limit)`. The policies only
/// differ when no limit was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalPagesPolicy {
    /// Divide by the effective limit: an unpaged listing is one page
    /// (or zero pages when nothing matched)
    #[default]
    EffectiveLimit,
    /// Divide by one when unpaged, so `totalPages == total`. Kept for clients
    /// written against the earlier API.
    Legacy,
}

/// One page of results plus the counts needed to navigate the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    /// Rows in this page, in query order
    pub data: Vec<T>,
    /// Current page number (1-indexed)
    pub page: u64,
    /// Effective page size
    pub limit: u64,
    /// Rows matching the filter across all pages
    pub total: u64,
    /// Number of pages at this page size
    pub total_pages: u64,
}

impl<T> PagedResult<T> {
    /// Build the envelope for rows fetched through `window`
    ///
    /// ```rust
    /// use classroom_service::repository::{PageWindow, PagedResult, TotalPagesPolicy};
    ///
    /// let window = PageWindow::paged(2, 10);
    /// let page = PagedResult::assemble(vec!["k"], &window, 11, TotalPagesPolicy::default());
    /// assert_eq!(page.total_pages, 2);
    /// assert_eq!(page.limit, 10);
    /// ```
    pub fn assemble(data: Vec<T>, window: &PageWindow, total: u64, policy: TotalPagesPolicy) -> Self {
        let limit = window.take.unwrap_or(total);
        let divisor = match (policy, window.take) {
            (_, Some(take)) => take,
            (TotalPagesPolicy::EffectiveLimit, None) => total,
            (TotalPagesPolicy::Legacy, None) => 1,
        };

        Self {
            data,
            page: window.page,
            limit,
            total,
            total_pages: calculate_total_pages(total, divisor),
        }
    }

    /// Map each row to a new type, keeping the counts
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Ceiling division; a zero divisor yields zero pages
fn calculate_total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.saturating_add(per_page - 1) / per_page
}

impl<T: Serialize> IntoResponse for PagedResult<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
