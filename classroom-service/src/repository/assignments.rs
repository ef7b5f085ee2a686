//! Assignment persistence and the assignment listing composer

use serde::Deserialize;
use sqlx::SqlitePool;

use super::error::{RepositoryError, RepositoryOperation, SqlxResultExt};
use super::page::{PagedResult, TotalPagesPolicy};
use super::pagination::{paginate, PaginationRequest, SortPolicy};
use super::predicate::{FilterCondition, Predicate};
use super::select::{JoinGraph, SelectQuery};
use super::traits::RepositoryResult;
use crate::models::{Assignment, Subject};

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "assignment.id"),
    ("title", "assignment.title"),
    ("subject", "assignment.subject"),
    ("content", "assignment.content"),
];

/// Columns a free-text search is matched against
pub const SEARCH_FIELDS: &[&str] = &[
    "assignment.title",
    "assignment.content",
    "student.name",
    "student.email",
    "teacher.name",
    "teacher.email",
];

/// Assignment joined with its student and, when graded, the grade and its teacher
pub static ASSIGNMENT_GRAPH: JoinGraph = JoinGraph {
    entity: "Assignment",
    projection: "SELECT assignment.id AS assignment_id, assignment.title AS assignment_title, \
                 assignment.content AS assignment_content, assignment.subject AS assignment_subject, \
                 student.id AS student_id, student.name AS student_name, \
                 student.email AS student_email, student.role AS student_role, \
                 grade.id AS grade_id, grade.grade AS grade_grade, grade.feedback AS grade_feedback, \
                 teacher.id AS teacher_id, teacher.name AS teacher_name, \
                 teacher.email AS teacher_email, teacher.role AS teacher_role",
    source: "FROM assignments AS assignment \
             INNER JOIN users AS student ON student.id = assignment.student_id \
             LEFT JOIN grades AS grade ON grade.assignment_id = assignment.id \
             LEFT JOIN users AS teacher ON teacher.id = grade.teacher_id",
    sort_policy: SortPolicy::new(SORT_COLUMNS, "id"),
};

/// Filters and paging for an assignment listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentListQuery {
    /// Case-insensitive substring over [`SEARCH_FIELDS`]
    pub search: Option<String>,
    /// Exact subject match
    pub subject: Option<Subject>,
    pub pagination: Option<PaginationRequest>,
}

impl AssignmentListQuery {
    /// Predicate for this query, optionally scoped to one student
    ///
    /// Absent and empty filters add nothing, so the predicate for an empty
    /// query matches every assignment.
    pub fn predicate(&self, student_id: Option<i64>) -> Predicate {
        let search = self
            .search
            .as_deref()
            .filter(|needle| !needle.is_empty())
            .map(|needle| Predicate::any_contains(SEARCH_FIELDS, needle));
        let subject = self
            .subject
            .map(|subject| FilterCondition::eq("assignment.subject", subject.as_str()).into());
        let student = student_id.map(|id| FilterCondition::eq("student.id", id).into());

        Predicate::and([search, subject, student].into_iter().flatten())
    }
}

/// Payload for a new submission
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    pub content: String,
    pub subject: Subject,
}

/// Assignment store
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    pool: SqlitePool,
    total_pages: TotalPagesPolicy,
}

impl AssignmentRepository {
    pub fn new(pool: SqlitePool, total_pages: TotalPagesPolicy) -> Self {
        Self { pool, total_pages }
    }

    /// Record a submission for `student_id` and return it with its student
    pub async fn create(&self, student_id: i64, assignment: NewAssignment) -> RepositoryResult<Assignment> {
        let op = RepositoryOperation::Create;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO assignments (title, content, subject, student_id) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&assignment.title)
        .bind(&assignment.content)
        .bind(assignment.subject)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .during(op)
        .map_err(|e| e.with_entity("Assignment", format!("student {student_id}")))?;

        tracing::debug!(assignment_id = id, student_id, "Assignment stored");
        self.find_by_id(id).await.map_err(|e| e.with_operation(op))
    }

    /// Load one assignment with its student and grade
    pub async fn find_by_id(&self, id: i64) -> RepositoryResult<Assignment> {
        SelectQuery::<Assignment>::new(
            self.pool.clone(),
            &ASSIGNMENT_GRAPH,
            FilterCondition::eq("assignment.id", id).into(),
        )
        .fetch_optional(RepositoryOperation::FindById)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Assignment", id.to_string()))
    }

    /// One page of assignments matching `query`
    ///
    /// `student_id` restricts the listing to that student's submissions and
    /// combines with the other filters by conjunction.
    pub async fn find_paginated(
        &self,
        query: &AssignmentListQuery,
        student_id: Option<i64>,
    ) -> RepositoryResult<PagedResult<Assignment>> {
        let select = SelectQuery::<Assignment>::new(
            self.pool.clone(),
            &ASSIGNMENT_GRAPH,
            query.predicate(student_id),
        );
        paginate(&select, query.pagination.as_ref(), self.total_pages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::repository::fixtures::{self, Classroom};
    use crate::repository::{RepositoryErrorKind, SortOrder};

    async fn setup(policy: TotalPagesPolicy) -> (AssignmentRepository, Classroom) {
        let pool = memory_pool().await;
        let classroom = fixtures::classroom(&pool).await;
        (AssignmentRepository::new(pool, policy), classroom)
    }

    fn paged(page: u64, limit: u64) -> Option<PaginationRequest> {
        Some(PaginationRequest {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        })
    }

    fn ids(page: &PagedResult<Assignment>) -> Vec<i64> {
        page.data.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(AssignmentListQuery::default().predicate(None).is_always());
        let blank = AssignmentListQuery {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.predicate(None).is_always());
    }

    #[tokio::test]
    async fn test_unpaged_listing_returns_everything_newest_first() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let page = repo.find_paginated(&AssignmentListQuery::default(), None).await.unwrap();

        assert_eq!(ids(&page), vec![c.geometry, c.essay, c.algebra]);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 3);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_unpaged_listing_under_legacy_policy() {
        let (repo, _) = setup(TotalPagesPolicy::Legacy).await;
        let page = repo.find_paginated(&AssignmentListQuery::default(), None).await.unwrap();
        assert_eq!(page.limit, 3);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_across_relations() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;

        for (needle, expected) in [
            ("alge", vec![c.algebra]),
            ("essay", vec![c.essay]),
            ("MARLEY", vec![c.geometry]),
            ("grace@", vec![c.algebra]),
            ("school.test", vec![c.geometry, c.essay, c.algebra]),
        ] {
            let query = AssignmentListQuery {
                search: Some(needle.to_string()),
                ..Default::default()
            };
            let page = repo.find_paginated(&query, None).await.unwrap();
            assert_eq!(ids(&page), expected, "search {needle}");
            assert_eq!(page.total, expected.len() as u64);
        }
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let (repo, _) = setup(TotalPagesPolicy::default()).await;
        let query = AssignmentListQuery {
            search: Some("%".to_string()),
            ..Default::default()
        };
        let page = repo.find_paginated(&query, None).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_student_scope_combines_with_subject() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let query = AssignmentListQuery {
            subject: Some(Subject::Math),
            ..Default::default()
        };

        let scoped = repo.find_paginated(&query, Some(c.ada)).await.unwrap();
        assert_eq!(ids(&scoped), vec![c.algebra]);

        let all_math = repo.find_paginated(&query, None).await.unwrap();
        assert_eq!(ids(&all_math), vec![c.geometry, c.algebra]);

        let other = repo
            .find_paginated(&AssignmentListQuery::default(), Some(c.bob))
            .await
            .unwrap();
        assert!(other.data.iter().all(|a| a.student.id == c.bob));
        assert_eq!(other.total, 1);
    }

    #[tokio::test]
    async fn test_student_scope_narrows_shared_search() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let query = AssignmentListQuery {
            search: Some("school.test".to_string()),
            ..Default::default()
        };

        let scoped = repo.find_paginated(&query, Some(c.ada)).await.unwrap();
        assert_eq!(ids(&scoped), vec![c.essay, c.algebra]);
        assert_eq!(scoped.total, 2);
        assert!(scoped.data.iter().all(|a| a.student.id == c.ada));
    }

    #[tokio::test]
    async fn test_pages_are_disjoint_and_cover_the_result() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let first = repo
            .find_paginated(
                &AssignmentListQuery {
                    pagination: paged(1, 2),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        let second = repo
            .find_paginated(
                &AssignmentListQuery {
                    pagination: paged(2, 2),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(ids(&first), vec![c.geometry, c.essay]);
        assert_eq!(ids(&second), vec![c.algebra]);
        assert_eq!(first.total_pages, 2);
        assert_eq!(second.total, 3);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty_with_true_total() {
        let (repo, _) = setup(TotalPagesPolicy::default()).await;
        let page = repo
            .find_paginated(
                &AssignmentListQuery {
                    pagination: paged(99, 2),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.page, 99);
        assert_eq!(page.limit, 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_sort_by_title_ascending() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let query = AssignmentListQuery {
            pagination: Some(PaginationRequest {
                sort_by: Some("title".to_string()),
                sort_order: Some(SortOrder::Asc),
                ..Default::default()
            }),
            ..Default::default()
        };
        let page = repo.find_paginated(&query, None).await.unwrap();
        assert_eq!(ids(&page), vec![c.algebra, c.essay, c.geometry]);
    }

    #[tokio::test]
    async fn test_unknown_sort_key_is_rejected() {
        let (repo, _) = setup(TotalPagesPolicy::default()).await;
        let query = AssignmentListQuery {
            pagination: Some(PaginationRequest {
                sort_by: Some("student_id".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = repo.find_paginated(&query, None).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_graded_assignment_carries_grade_and_teacher() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let graded = repo.find_by_id(c.algebra).await.unwrap();
        let grade = graded.grade.unwrap();
        assert_eq!(grade.grade, 9.5);
        assert_eq!(grade.teacher.id, c.teacher);
        assert_eq!(graded.student.id, c.ada);

        assert!(repo.find_by_id(c.essay).await.unwrap().grade.is_none());
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, c) = setup(TotalPagesPolicy::default()).await;
        let created = repo
            .create(
                c.bob,
                NewAssignment {
                    title: "Poem".to_string(),
                    content: "Roses".to_string(),
                    subject: Subject::English,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.student.name, "Bob Marley");
        assert_eq!(created.subject, Subject::English);
        assert!(created.grade.is_none());

        let err = repo.find_by_id(created.id + 100).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_for_missing_student_violates_constraint() {
        let (repo, _) = setup(TotalPagesPolicy::default()).await;
        let err = repo
            .create(
                4242,
                NewAssignment {
                    title: "Ghost".to_string(),
                    content: "Boo".to_string(),
                    subject: Subject::Math,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConstraintViolation);
    }
}
