//! Query executor capability
//!
//! [`PagedQuery`] is the typed handle the pagination engine runs against: one
//! entity's join graph with its filter already applied. Implementations use
//! RPITIT (Return Position Impl Trait In Traits) so no boxing is needed.

use std::future::Future;

use super::error::RepositoryError;
use super::pagination::{OrderBy, PageWindow, SortPolicy};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A filtered query over one entity that can be fetched a window at a time
///
/// # Example
///
/// ```rust,ignore
/// let query = AssignmentQuery::new(pool.clone(), &filter, Some(student_id));
/// let page = paginate(&query, request.as_ref(), TotalPagesPolicy::default()).await?;
/// ```
pub trait PagedQuery: Send + Sync {
    /// Row type produced by the query
    type Row: Send;

    /// Entity name used in logs and errors
    fn entity(&self) -> &'static str;

    /// Sortable keys and natural ordering of the entity
    fn sort_policy(&self) -> &SortPolicy;

    /// Fetch the rows inside `window` in `order`, together with the number of
    /// rows matching the filter regardless of the window
    ///
    /// Both values must come from one logical read so that `total` describes
    /// the same data as the rows.
    fn fetch_window(
        &self,
        window: &PageWindow,
        order: &OrderBy,
    ) -> impl Future<Output = RepositoryResult<(Vec<Self::Row>, u64)>> + Send;
}
