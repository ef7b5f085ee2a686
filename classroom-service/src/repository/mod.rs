//! Data access for the classroom entities
//!
//! Listing endpoints share one pipeline:
//!
//! - **Filtering**: [`Predicate`] trees built from [`FilterCondition`]s
//! - **Paging**: [`paginate`] resolves a [`PaginationRequest`] into a
//!   [`PageWindow`] and [`OrderBy`] and runs them through a [`PagedQuery`]
//! - **Envelope**: [`PagedResult`] carries the rows plus page, limit, total
//!   and total pages
//!
//! Entity composers ([`AssignmentRepository`], [`GradeRepository`]) only
//! decide which predicate to apply; the joins live in a static [`JoinGraph`]
//! and the paging math lives in [`paginate`].
//!
//! # Example
//!
//! ```rust,ignore
//! use classroom_service::repository::{AssignmentListQuery, AssignmentRepository};
//!
//! let repo = AssignmentRepository::new(pool.clone(), TotalPagesPolicy::default());
//! let page = repo
//!     .find_paginated(&AssignmentListQuery { search: Some("essay".into()), ..Default::default() }, None)
//!     .await?;
//! println!("{} of {}", page.data.len(), page.total);
//! ```

pub mod assignments;
pub mod error;
pub mod grades;
pub mod page;
pub mod pagination;
pub mod predicate;
pub mod select;
pub mod traits;
pub mod users;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assignments::{AssignmentListQuery, AssignmentRepository, NewAssignment, ASSIGNMENT_GRAPH};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation, SqlxResultExt};
pub use grades::{GradeListQuery, GradeRepository, GradeUpsert, GRADE_GRAPH};
pub use page::{PagedResult, TotalPagesPolicy};
pub use pagination::{paginate, OrderBy, PageWindow, PaginationRequest, SortOrder, SortPolicy};
pub use predicate::{escape_like, FilterCondition, FilterOperator, FilterValue, Predicate};
pub use select::{JoinGraph, SelectQuery};
pub use traits::{PagedQuery, RepositoryResult};
pub use users::{NewUser, UserRepository};
