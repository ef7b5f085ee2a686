//! Grading, grade listings and AI recommendations

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::error::{ApiError, ApiOperation};
use super::query::ListParams;
use crate::grading::{recommend as ask_advisor, GradeRecommendation};
use crate::middleware::CurrentUser;
use crate::models::{Grade, Role};
use crate::repository::{GradeUpsert, PagedResult};
use crate::state::AppState;

fn validate(grade: &GradeUpsert) -> Result<(), ApiError> {
    if !grade.grade.is_finite() {
        return Err(ApiError::bad_request("grade must be a number"));
    }
    Ok(())
}

/// `POST /grades`, teachers only
///
/// Creates the grade of an assignment or replaces the existing one.
pub async fn grade(
    user: CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<GradeUpsert>, JsonRejection>,
) -> Result<(StatusCode, Json<Grade>), ApiError> {
    user.require_role(Role::Teacher)?;
    let Json(payload) = payload.map_err(|e| ApiError::from(e).with_operation(ApiOperation::Upsert))?;
    validate(&payload).map_err(|e| e.with_operation(ApiOperation::Upsert))?;

    // Unknown assignments are a 404, not a foreign key conflict
    state
        .assignments
        .find_by_id(payload.assignment_id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Upsert))?;

    let grade = state.grades.upsert(user.id, payload).await?;
    tracing::info!(
        grade_id = grade.id,
        assignment_id = grade.assignment.id,
        teacher_id = user.id,
        "Assignment graded"
    );
    Ok((StatusCode::CREATED, Json(grade)))
}

/// `GET /grades`, teachers only
pub async fn list(
    user: CurrentUser,
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedResult<Grade>>, ApiError> {
    user.require_role(Role::Teacher)?;
    let Query(params) = params?;

    let page = state
        .grades
        .find_paginated(&params.grade_query()?, None)
        .await?;
    Ok(Json(page))
}

/// `GET /grades/{studentId}`, the student themself or a teacher
pub async fn list_for_student(
    user: CurrentUser,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedResult<Grade>>, ApiError> {
    let Path(student_id) = path?;
    user.ensure_related_student(student_id)?;
    let Query(params) = params?;

    let page = state
        .grades
        .find_paginated(&params.grade_query()?, Some(student_id))
        .await?;
    Ok(Json(page))
}

/// `GET /grades/ai/{assignmentId}`, teachers only
pub async fn recommend(
    user: CurrentUser,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<GradeRecommendation>, ApiError> {
    user.require_role(Role::Teacher)?;
    let Path(assignment_id) = path.map_err(|e| ApiError::from(e).with_operation(ApiOperation::Recommend))?;

    let assignment = state
        .assignments
        .find_by_id(assignment_id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Recommend))?;

    Ok(Json(ask_advisor(state.advisor.as_ref(), &assignment).await))
}
