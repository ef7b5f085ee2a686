//! SQLite realization of [`PagedQuery`]
//!
//! [`SelectQuery`] binds a fixed projection and join graph to a [`Predicate`]
//! and renders both the count and the windowed fetch from them, inside one
//! read transaction.

use std::marker::PhantomData;

use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::error::{RepositoryOperation, SqlxResultExt};
use super::pagination::{OrderBy, PageWindow, SortPolicy};
use super::predicate::Predicate;
use super::traits::{PagedQuery, RepositoryResult};

/// Static shape of a query over one entity's join graph
#[derive(Debug, Clone, Copy)]
pub struct JoinGraph {
    /// Entity name for logs and errors
    pub entity: &'static str,
    /// `SELECT` list with relation-prefixed aliases
    pub projection: &'static str,
    /// `FROM` clause including every join the filters and projection need
    pub source: &'static str,
    /// Sortable keys and natural ordering
    pub sort_policy: SortPolicy,
}

/// A filtered query over a [`JoinGraph`], decoded into `R`
pub struct SelectQuery<R> {
    pool: SqlitePool,
    graph: &'static JoinGraph,
    predicate: Predicate,
    _row: PhantomData<fn() -> R>,
}

impl<R> SelectQuery<R> {
    /// Bind `predicate` to `graph`
    pub fn new(pool: SqlitePool, graph: &'static JoinGraph, predicate: Predicate) -> Self {
        Self {
            pool,
            graph,
            predicate,
            _row: PhantomData,
        }
    }

    /// The filter this query applies
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Fetch the single row matching the filter, if any
    pub async fn fetch_optional(&self, operation: RepositoryOperation) -> RepositoryResult<Option<R>>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut qb = QueryBuilder::<Sqlite>::new(self.graph.projection);
        qb.push(" ").push(self.graph.source);
        self.predicate.push_where(&mut qb);
        qb.push(" LIMIT 1");

        qb.build_query_as::<R>()
            .fetch_optional(&self.pool)
            .await
            .during(operation)
    }

    fn count_sql(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) ");
        qb.push(self.graph.source);
        self.predicate.push_where(&mut qb);
        qb
    }

    fn window_sql(&self, window: &PageWindow, order: &OrderBy) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(self.graph.projection);
        qb.push(" ").push(self.graph.source);
        self.predicate.push_where(&mut qb);

        qb.push(" ORDER BY ")
            .push(order.column)
            .push(" ")
            .push(order.direction.as_sql());
        if let Some(tiebreaker) = order.tiebreaker {
            qb.push(", ")
                .push(tiebreaker)
                .push(" ")
                .push(order.direction.as_sql());
        }

        if let Some(take) = window.take {
            qb.push(" LIMIT ")
                .push_bind(i64::try_from(take).unwrap_or(i64::MAX))
                .push(" OFFSET ")
                .push_bind(i64::try_from(window.skip).unwrap_or(i64::MAX));
        }
        qb
    }
}

impl<R> PagedQuery for SelectQuery<R>
where
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    type Row = R;

    fn entity(&self) -> &'static str {
        self.graph.entity
    }

    fn sort_policy(&self) -> &SortPolicy {
        &self.graph.sort_policy
    }

    async fn fetch_window(
        &self,
        window: &PageWindow,
        order: &OrderBy,
    ) -> RepositoryResult<(Vec<R>, u64)> {
        let op = RepositoryOperation::FindPage;
        let mut count = self.count_sql();
        let mut select = self.window_sql(window, order);

        let mut tx = self.pool.begin().await.during(op)?;
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .during(op)?;
        let rows = select
            .build_query_as::<R>()
            .fetch_all(&mut *tx)
            .await
            .during(op)?;
        tx.commit().await.during(op)?;

        Ok((rows, u64::try_from(total).unwrap_or(0)))
    }
}
