//! Query-string parameters for listing endpoints
//!
//! Listing endpoints take a flat query string
//! (`?page=2&limit=10&sortBy=title&sortOrder=ASC&search=essay&subject=Math`).
//! [`ListParams`] validates it and builds the repository-level list queries.
//!
//! # Example
//!
//! ```rust
//! use classroom_service::handlers::ListParams;
//!
//! let params = ListParams { page: Some(2), limit: Some(10), ..Default::default() };
//! let query = params.assignment_query().unwrap();
//! let pagination = query.pagination.unwrap();
//! assert_eq!(pagination.page, Some(2));
//! assert_eq!(pagination.limit, Some(10));
//! ```

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::models::Subject;
use crate::repository::{
    AssignmentListQuery, GradeListQuery, PaginationRequest, SortOrder, SortPolicy, ASSIGNMENT_GRAPH,
    GRADE_GRAPH,
};

/// Flat listing parameters as they appear in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Page number (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,

    /// Page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Sort key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    /// `ASC` or `DESC`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,

    /// Free-text search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Subject filter (assignments only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
}

impl ListParams {
    /// Validated pagination request, present iff any paging key was given
    pub fn pagination(&self, sort_policy: &SortPolicy) -> Result<Option<PaginationRequest>, ApiError> {
        if self.page == Some(0) {
            return Err(ApiError::bad_request("page must be a positive integer"));
        }
        if self.limit == Some(0) {
            return Err(ApiError::bad_request("limit must be a positive integer"));
        }
        if let Some(key) = self.sort_by.as_deref() {
            if !sort_policy.is_sortable(key) {
                let keys: Vec<&str> = sort_policy.keys().collect();
                return Err(ApiError::bad_request(format!(
                    "sortBy must be one of: {}",
                    keys.join(", ")
                )));
            }
        }

        let any_paging_key = self.page.is_some()
            || self.limit.is_some()
            || self.sort_by.is_some()
            || self.sort_order.is_some();

        Ok(any_paging_key.then(|| PaginationRequest {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
        }))
    }

    /// Assignment listing query
    pub fn assignment_query(&self) -> Result<AssignmentListQuery, ApiError> {
        Ok(AssignmentListQuery {
            search: self.search.clone(),
            subject: self.subject,
            pagination: self.pagination(&ASSIGNMENT_GRAPH.sort_policy)?,
        })
    }

    /// Grade listing query; `subject` does not apply to grades and is ignored
    pub fn grade_query(&self) -> Result<GradeListQuery, ApiError> {
        Ok(GradeListQuery {
            search: self.search.clone(),
            pagination: self.pagination(&GRADE_GRAPH.sort_policy)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;

    fn parse(query: &str) -> ListParams {
        let uri: axum::http::Uri = format!("/assignments?{query}").parse().unwrap();
        axum::extract::Query::<ListParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_parses_flat_query_string() {
        let params = parse("page=2&limit=5&sortBy=title&sortOrder=ASC&search=essay&subject=Math");
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.sort_by.as_deref(), Some("title"));
        assert_eq!(params.sort_order, Some(SortOrder::Asc));
        assert_eq!(params.search.as_deref(), Some("essay"));
        assert_eq!(params.subject, Some(Subject::Math));
    }

    #[test]
    fn test_no_paging_keys_means_no_pagination() {
        let query = parse("search=essay").assignment_query().unwrap();
        assert_eq!(query.pagination, None);
        assert_eq!(query.search.as_deref(), Some("essay"));
    }

    #[test]
    fn test_sort_order_alone_requests_pagination() {
        let query = parse("sortOrder=ASC").grade_query().unwrap();
        let pagination = query.pagination.unwrap();
        assert_eq!(pagination.sort_order, Some(SortOrder::Asc));
        assert_eq!(pagination.limit, None);
    }

    #[test]
    fn test_rejects_zero_page_and_limit() {
        let err = parse("page=0&limit=10").assignment_query().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::BadRequest);
        assert!(err.message.contains("page"));

        let err = parse("limit=0").assignment_query().unwrap_err();
        assert!(err.message.contains("limit"));
    }

    #[test]
    fn test_sort_keys_are_per_entity() {
        assert!(parse("sortBy=subject").assignment_query().is_ok());

        let err = parse("sortBy=subject").grade_query().unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::BadRequest);
        assert_eq!(err.message, "sortBy must be one of: id, grade, feedback");
    }

    #[test]
    fn test_malformed_values_fail_extraction() {
        for query in ["page=-1", "limit=ten", "sortOrder=UP", "subject=History"] {
            let uri: axum::http::Uri = format!("/grades?{query}").parse().unwrap();
            assert!(
                axum::extract::Query::<ListParams>::try_from_uri(&uri).is_err(),
                "{query} should be rejected"
            );
        }
    }
}
