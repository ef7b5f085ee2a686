//! Grade persistence and the grade listing composer

use serde::Deserialize;
use sqlx::SqlitePool;

use super::error::{RepositoryError, RepositoryOperation, SqlxResultExt};
use super::page::{PagedResult, TotalPagesPolicy};
use super::pagination::{paginate, PaginationRequest, SortPolicy};
use super::predicate::{FilterCondition, Predicate};
use super::select::{JoinGraph, SelectQuery};
use super::traits::RepositoryResult;
use crate::models::Grade;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "grade.id"),
    ("grade", "grade.grade"),
    ("feedback", "grade.feedback"),
];

/// Columns a free-text search is matched against
pub const SEARCH_FIELDS: &[&str] = &[
    "grade.feedback",
    "teacher.name",
    "assignment.title",
    "assignment.content",
];

/// Grade joined with its assignment, the assignment's student and the grading teacher
pub static GRADE_GRAPH: JoinGraph = JoinGraph {
    entity: "Grade",
    projection: "SELECT grade.id AS grade_id, grade.grade AS grade_grade, grade.feedback AS grade_feedback, \
                 assignment.id AS assignment_id, assignment.title AS assignment_title, \
                 assignment.content AS assignment_content, assignment.subject AS assignment_subject, \
                 student.id AS student_id, student.name AS student_name, \
                 student.email AS student_email, student.role AS student_role, \
                 teacher.id AS teacher_id, teacher.name AS teacher_name, \
                 teacher.email AS teacher_email, teacher.role AS teacher_role",
    source: "FROM grades AS grade \
             INNER JOIN assignments AS assignment ON assignment.id = grade.assignment_id \
             INNER JOIN users AS student ON student.id = assignment.student_id \
             INNER JOIN users AS teacher ON teacher.id = grade.teacher_id",
    sort_policy: SortPolicy::new(SORT_COLUMNS, "id"),
};

/// Filters and paging for a grade listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeListQuery {
    /// Case-insensitive substring over [`SEARCH_FIELDS`]
    pub search: Option<String>,
    pub pagination: Option<PaginationRequest>,
}

impl GradeListQuery {
    /// Predicate for this query, optionally scoped to the grades of one student
    pub fn predicate(&self, student_id: Option<i64>) -> Predicate {
        let search = self
            .search
            .as_deref()
            .filter(|needle| !needle.is_empty())
            .map(|needle| Predicate::any_contains(SEARCH_FIELDS, needle));
        let student = student_id.map(|id| FilterCondition::eq("student.id", id).into());

        Predicate::and([search, student].into_iter().flatten())
    }
}

/// Grade to record for an assignment
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpsert {
    pub assignment_id: i64,
    pub grade: f64,
    /// Absent feedback keeps the current text of an existing grade
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Grade store
#[derive(Debug, Clone)]
pub struct GradeRepository {
    pool: SqlitePool,
    total_pages: TotalPagesPolicy,
}

impl GradeRepository {
    pub fn new(pool: SqlitePool, total_pages: TotalPagesPolicy) -> Self {
        Self { pool, total_pages }
    }

    /// Create or replace the single grade of an assignment
    ///
    /// The grading teacher always becomes `teacher_id`.
    pub async fn upsert(&self, teacher_id: i64, grade: GradeUpsert) -> RepositoryResult<Grade> {
        let op = RepositoryOperation::Upsert;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO grades (assignment_id, teacher_id, grade, feedback) \
             VALUES (?, ?, ?, COALESCE(?, '')) \
             ON CONFLICT(assignment_id) DO UPDATE SET \
                 teacher_id = excluded.teacher_id, \
                 grade = excluded.grade, \
                 feedback = COALESCE(?, grades.feedback) \
             RETURNING id",
        )
        .bind(grade.assignment_id)
        .bind(teacher_id)
        .bind(grade.grade)
        .bind(grade.feedback.as_deref())
        .bind(grade.feedback.as_deref())
        .fetch_one(&self.pool)
        .await
        .during(op)
        .map_err(|e| e.with_entity("Assignment", grade.assignment_id.to_string()))?;

        tracing::debug!(
            grade_id = id,
            assignment_id = grade.assignment_id,
            teacher_id,
            "Grade stored"
        );

        self.find_by_id(id).await.map_err(|e| e.with_operation(op))
    }

    /// Load one grade with its assignment and teacher
    pub async fn find_by_id(&self, id: i64) -> RepositoryResult<Grade> {
        SelectQuery::<Grade>::new(
            self.pool.clone(),
            &GRADE_GRAPH,
            FilterCondition::eq("grade.id", id).into(),
        )
        .fetch_optional(RepositoryOperation::FindById)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Grade", id.to_string()))
    }

    /// One page of grades matching `query`, optionally only those of one student
    pub async fn find_paginated(
        &self,
        query: &GradeListQuery,
        student_id: Option<i64>,
    ) -> RepositoryResult<PagedResult<Grade>> {
        let select = SelectQuery::<Grade>::new(self.pool.clone(), &GRADE_GRAPH, query.predicate(student_id));
        paginate(&select, query.pagination.as_ref(), self.total_pages).await
    }
}
