//! Response types for the HR back-office API.
//!
//! This module defines the error response structures and the mapping from
//! [`HrError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::HrError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<HrError> for ApiErrorResponse {
    fn from(error: HrError) -> Self {
        let code = error.code();
        let (status, error) = match &error {
            HrError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(code, error.to_string(), format!("field: {}", field)),
            ),
            HrError::NotFound { .. } | HrError::SupervisorNotFound { .. } => {
                (StatusCode::NOT_FOUND, ApiError::new(code, error.to_string()))
            }
            HrError::AlreadyDecided { .. } | HrError::DuplicatePunch { .. } => {
                (StatusCode::CONFLICT, ApiError::new(code, error.to_string()))
            }
            HrError::BalanceNotFound { .. } | HrError::InsufficientBalance { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new(code, error.to_string()),
            ),
            HrError::UpstreamUnavailable { service, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new(code, format!("Upstream '{}' unavailable", service)),
            ),
            HrError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(code, "Internal server error"),
            ),
            HrError::ConfigNotFound { .. } | HrError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(code, "Configuration error"),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn map(error: HrError) -> ApiErrorResponse {
        error.into()
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details")); // skipped when None
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = map(HrError::validation("day_count", "must be positive"));
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
        assert_eq!(response.error.details.as_deref(), Some("field: day_count"));
    }

    #[test]
    fn test_status_mapping_per_kind() {
        let cases = [
            (
                HrError::SupervisorNotFound {
                    emp_id: "EMP001".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                HrError::AlreadyDecided {
                    approval_id: 3,
                    status: "approved".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                HrError::InsufficientBalance {
                    emp_id: "EMP001".into(),
                    leave_type: "casual".into(),
                    requested: Decimal::new(5, 0),
                    remaining: Decimal::new(2, 0),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                HrError::UpstreamUnavailable {
                    service: "device feed".into(),
                    message: "timeout".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(map(error).status, status);
        }
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let response = map(HrError::internal("record store: disk I/O error"));
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error.message, "Internal server error");
        assert!(response.error.details.is_none());
    }
}
