//! RFC 9457 Problem Details for HTTP APIs.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use threatmap_lib::Error as LibError;

/// Problem type URI for malformed or out-of-range request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for deletes of an unknown threat id.
pub const PROBLEM_THREAT_NOT_FOUND: &str = "/problems/threat-not-found";

/// Problem type URI for threats the store refused to insert.
pub const PROBLEM_INVALID_THREAT: &str = "/problems/invalid-threat";

/// Problem type URI for attempts to delete the permanent fixture record.
pub const PROBLEM_PROTECTED_THREAT: &str = "/problems/protected-threat";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for an unreadable threat store.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// RFC 9457 Problem Details response structure.
///
/// ```
/// use threatmap_service::{ProblemDetails, PROBLEM_THREAT_NOT_FOUND};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_THREAT_NOT_FOUND,
///     "Threat Not Found",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("No threat with id 'abc'")
/// .with_request_id("req-12345");
/// assert_eq!(problem.status, 404);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    pub title: String,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request id of the failing call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Always "application/problem+json".
    pub content_type: String,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            content_type: "application/problem+json".to_string(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 400 for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 404 for a delete that matched nothing.
    pub fn threat_not_found(id: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_THREAT_NOT_FOUND,
            "Threat Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("No threat with id '{}'", id))
        .with_request_id(request_id)
    }

    /// 403 for a delete of the permanent fixture record.
    pub fn protected_threat(id: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_PROTECTED_THREAT,
            "Protected Threat",
            StatusCode::FORBIDDEN,
        )
        .with_detail(format!("Threat '{}' is permanent and cannot be deleted", id))
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.status)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self),
        )
            .into_response()
    }
}

/// Map a library error onto a problem response.
///
/// The `request_id` must be provided separately since library errors don't carry it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::InvalidThreat { message } => ProblemDetails::new(
            PROBLEM_INVALID_THREAT,
            "Invalid Threat",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(message.clone())
        .with_request_id(request_id),
        LibError::CorruptStore { path, .. } => ProblemDetails::service_unavailable(
            format!("Threat store at {} is unreadable", path.display()),
            request_id,
        ),
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_problem_content_type() {
        let problem = ProblemDetails::new(
            PROBLEM_THREAT_NOT_FOUND,
            "Threat Not Found",
            StatusCode::NOT_FOUND,
        );
        assert_eq!(problem.type_uri, PROBLEM_THREAT_NOT_FOUND);
        assert_eq!(problem.status, 404);
        assert_eq!(problem.content_type, "application/problem+json");
    }

    #[test]
    fn serializes_type_field_and_skips_empty_optionals() {
        let json = serde_json::to_string(&ProblemDetails::bad_request("bad", "req-1")).unwrap();
        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"instance\":\"req-1\""));

        let bare = ProblemDetails::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        let json = serde_json::to_string(&bare).unwrap();
        assert!(!json.contains("detail"));
        assert!(!json.contains("instance"));
    }

    #[test]
    fn invalid_threat_maps_to_400() {
        let error = LibError::InvalidThreat {
            message: "a threat with id 'x' already exists".to_string(),
        };
        let problem = from_lib_error(&error, "req-2");
        assert_eq!(problem.type_uri, PROBLEM_INVALID_THREAT);
        assert_eq!(problem.status, 400);
        assert!(problem.detail.unwrap().contains("already exists"));
    }

    #[test]
    fn corrupt_store_maps_to_503() {
        let error = LibError::CorruptStore {
            path: "/data/threats.json".into(),
            message: "expected value".to_string(),
        };
        let problem = from_lib_error(&error, "req-3");
        assert_eq!(problem.status, 503);
        assert_eq!(problem.type_uri, PROBLEM_SERVICE_UNAVAILABLE);
    }

    #[test]
    fn other_errors_map_to_500() {
        let error = LibError::collaborator("advisor", "boom");
        assert_eq!(from_lib_error(&error, "req-4").status, 500);
    }

    #[test]
    fn into_response_uses_problem_status_and_header() {
        let response = ProblemDetails::threat_not_found("abc", "req-5").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
