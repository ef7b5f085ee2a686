//! Pagination engine
//!
//! Turns a declarative [`PaginationRequest`] into a [`PageWindow`] (skip/take)
//! and an [`OrderBy`], runs one count-and-fetch through a [`PagedQuery`], and
//! assembles the [`PagedResult`] envelope. Entity composers never do paging
//! math themselves.
//!
//! # Example
//!
//! ```rust
//! use classroom_service::repository::{PageWindow, PaginationRequest};
//!
//! let request = PaginationRequest { page: Some(3), limit: Some(20), ..Default::default() };
//! let window = PageWindow::from_request(Some(&request));
//! assert_eq!(window.skip, 40);
//! assert_eq!(window.take, Some(20));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{RepositoryError, RepositoryOperation};
use super::page::{PagedResult, TotalPagesPolicy};
use super::traits::{PagedQuery, RepositoryResult};

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Sort in ascending order (A-Z, 0-9)
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    /// Sort in descending order (Z-A, 9-0)
    #[default]
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Page/limit/sort specification as supplied by the caller
///
/// Absent as a whole means "everything, one page". Values are expected to be
/// validated upstream; the engine tolerates `limit == 0` by treating it as no
/// limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationRequest {
    /// Page number (1-indexed)
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size
    #[serde(default)]
    pub limit: Option<u64>,
    /// Sort key, one of the entity's sortable keys
    #[serde(default)]
    pub sort_by: Option<String>,
    /// Sort direction
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

/// Resolved skip/take for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Page number reported back to the caller
    pub page: u64,
    /// Rows to skip
    pub skip: u64,
    /// Rows to take; `None` fetches everything
    pub take: Option<u64>,
}

impl PageWindow {
    /// A window covering every row
    #[must_use]
    pub const fn unpaged() -> Self {
        Self {
            page: 1,
            skip: 0,
            take: None,
        }
    }

    /// Window for 1-indexed `page` at `limit` rows per page
    ///
    /// Page 0 is clamped to page 1.
    #[must_use]
    pub const fn paged(page: u64, limit: u64) -> Self {
        let page = if page == 0 { 1 } else { page };
        Self {
            page,
            skip: (page - 1).saturating_mul(limit),
            take: Some(limit),
        }
    }

    /// Resolve the window for an optional request
    #[must_use]
    pub fn from_request(request: Option<&PaginationRequest>) -> Self {
        match request.and_then(|r| r.limit.filter(|limit| *limit > 0).map(|limit| (r, limit))) {
            Some((request, limit)) => Self::paged(request.page.unwrap_or(1), limit),
            None => Self::unpaged(),
        }
    }
}

/// Resolved ordering for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    /// Qualified column to sort on
    pub column: &'static str,
    /// Sort direction
    pub direction: SortOrder,
    /// Secondary column appended when `column` is not unique
    pub tiebreaker: Option<&'static str>,
}

/// Sortable keys of an entity and its natural ordering
///
/// Maps the sort keys clients may name to qualified columns, and fixes the
/// default ordering (by default: the primary key, descending). Entities whose
/// natural key is not `id` pass their own key to [`SortPolicy::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPolicy {
    columns: &'static [(&'static str, &'static str)],
    default_key: &'static str,
    default_direction: SortOrder,
}

impl SortPolicy {
    /// Policy over `columns` (`(sort key, qualified column)` pairs) whose
    /// default ordering is `default_key` descending
    ///
    /// `default_key` must be one of the keys in `columns` and should be unique
    /// per row.
    #[must_use]
    pub const fn new(
        columns: &'static [(&'static str, &'static str)],
        default_key: &'static str,
    ) -> Self {
        Self {
            columns,
            default_key,
            default_direction: SortOrder::Desc,
        }
    }

    /// Override the default direction
    #[must_use]
    pub const fn with_default_direction(mut self, direction: SortOrder) -> Self {
        self.default_direction = direction;
        self
    }

    /// Whether clients may sort on `key`
    pub fn is_sortable(&self, key: &str) -> bool {
        self.column(key).is_some()
    }

    /// Sort keys clients may use
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        let columns = self.columns;
        columns.iter().map(|(key, _)| *key)
    }

    fn column(&self, key: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, column)| *column)
    }

    /// Resolve the ordering for a request
    ///
    /// Unknown sort keys fail with `ValidationFailed` rather than being
    /// silently ignored.
    pub fn resolve(&self, request: Option<&PaginationRequest>) -> RepositoryResult<OrderBy> {
        let default_column = self.column(self.default_key).ok_or_else(|| {
            RepositoryError::validation_failed(
                RepositoryOperation::FindPage,
                format!("Default sort key '{}' is not sortable", self.default_key),
            )
        })?;

        let key = request
            .and_then(|r| r.sort_by.as_deref())
            .unwrap_or(self.default_key);
        let column = self.column(key).ok_or_else(|| {
            RepositoryError::validation_failed(
                RepositoryOperation::FindPage,
                format!("Unknown sort column '{}'", key),
            )
        })?;

        let direction = match request {
            Some(PaginationRequest {
                sort_order: Some(order),
                ..
            }) => *order,
            Some(PaginationRequest {
                sort_by: Some(_), ..
            }) => SortOrder::Desc,
            _ => self.default_direction,
        };

        Ok(OrderBy {
            column,
            direction,
            tiebreaker: (column != default_column).then_some(default_column),
        })
    }
}

/// Run one paged fetch of `query`
///
/// Resolves the window and ordering, executes a single count-and-fetch and
/// wraps the rows in a [`PagedResult`]. Store errors are returned unchanged.
pub async fn paginate<Q>(
    query: &Q,
    request: Option<&PaginationRequest>,
    policy: TotalPagesPolicy,
) -> RepositoryResult<PagedResult<Q::Row>>
where
    Q: PagedQuery,
{
    let window = PageWindow::from_request(request);
    let order = query.sort_policy().resolve(request)?;

    let (rows, total) = query.fetch_window(&window, &order).await?;

    tracing::debug!(
        entity = query.entity(),
        page = window.page,
        skip = window.skip,
        take = ?window.take,
        order = %format!("{} {}", order.column, order.direction),
        total,
        returned = rows.len(),
        "Fetched page"
    );

    Ok(PagedResult::assemble(rows, &window, total, policy))
}
