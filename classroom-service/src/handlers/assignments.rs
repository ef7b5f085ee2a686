//! Assignment submission and listings

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::error::{ApiError, ApiOperation};
use super::query::ListParams;
use crate::middleware::CurrentUser;
use crate::models::{Assignment, Role, Subject};
use crate::notifications::{notify, NewAssignmentNotice};
use crate::repository::{NewAssignment, PagedResult};
use crate::state::AppState;

const SUBJECT_MESSAGE: &str = "The subject must be either 'English' or 'Math'.";

/// Submission payload
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAssignment {
    pub title: String,
    pub content: String,
    pub subject: String,
}

impl SubmitAssignment {
    fn validate(self) -> Result<NewAssignment, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::bad_request("title should not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(ApiError::bad_request("content should not be empty"));
        }
        let subject = match self.subject.as_str() {
            "English" => Subject::English,
            "Math" => Subject::Math,
            _ => return Err(ApiError::bad_request(SUBJECT_MESSAGE)),
        };

        Ok(NewAssignment {
            title: self.title,
            content: self.content,
            subject,
        })
    }
}

/// `POST /assignments`, students only
///
/// Teachers are notified once the submission is stored; a failed
/// notification does not fail the request.
pub async fn submit(
    user: CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<SubmitAssignment>, JsonRejection>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    user.require_role(Role::Student)?;
    let Json(payload) = payload?;
    let assignment = payload
        .validate()
        .map_err(|e| e.with_operation(ApiOperation::Create))?;

    let assignment = state.assignments.create(user.id, assignment).await?;
    tracing::info!(
        assignment_id = assignment.id,
        student_id = user.id,
        subject = assignment.subject.as_str(),
        "Assignment submitted"
    );

    match state.users.find_by_role(Role::Teacher).await {
        Ok(teachers) => {
            let notice = NewAssignmentNotice::new(
                &teachers,
                assignment.clone(),
                state.config().service.is_production(),
            );
            notify(state.publisher.as_ref(), &notice).await;
        }
        Err(e) => tracing::warn!(error = %e, "Could not load teachers to notify"),
    }

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// `GET /assignments`, teachers only
pub async fn list(
    user: CurrentUser,
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedResult<Assignment>>, ApiError> {
    user.require_role(Role::Teacher)?;
    let Query(params) = params?;

    let page = state
        .assignments
        .find_paginated(&params.assignment_query()?, None)
        .await?;
    Ok(Json(page))
}

/// `GET /assignments/{studentId}`, the student themself or a teacher
pub async fn list_for_student(
    user: CurrentUser,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedResult<Assignment>>, ApiError> {
    let Path(student_id) = path?;
    user.ensure_related_student(student_id)?;
    let Query(params) = params?;

    let page = state
        .assignments
        .find_paginated(&params.assignment_query()?, Some(student_id))
        .await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;

    fn submission(subject: &str) -> SubmitAssignment {
        SubmitAssignment {
            title: "Essay".to_string(),
            content: "Once upon a time".to_string(),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_subject_must_be_known() {
        assert_eq!(submission("English").validate().unwrap().subject, Subject::English);

        let err = submission("History").validate().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::BadRequest);
        assert_eq!(err.message, SUBJECT_MESSAGE);
    }

    #[test]
    fn test_title_and_content_required() {
        let mut blank = submission("Math");
        blank.title = String::new();
        assert!(blank.validate().is_err());

        let mut blank = submission("Math");
        blank.content = " ".to_string();
        assert!(blank.validate().is_err());
    }
}
