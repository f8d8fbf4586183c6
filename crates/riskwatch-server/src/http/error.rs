//! JSON error responses for the non-streaming endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::collaborators::CollaboratorError;
use crate::pipeline::StepError;

/// Error details in a response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorObject {
    pub message: String,

    #[serde(rename = "type")]
    pub error_type: String,

    pub code: String,
}

/// Error response wrapper.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

/// API errors with proper HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    // Client errors (4xx)
    /// Invalid JSON in request body.
    InvalidJson { message: String },
    /// Request failed validation.
    InvalidInput { message: String },

    // Server errors (5xx)
    /// An upstream collaborator failed.
    Upstream { message: String },
    /// The run exceeded its deadline.
    Timeout { message: String },
    /// Internal server error.
    Internal { message: String },
}

impl From<StepError> for ApiError {
    fn from(e: StepError) -> Self {
        let message = e.to_string();
        match e {
            StepError::Validation(_) => ApiError::InvalidInput { message },
            StepError::Collaborator { .. } => ApiError::Upstream { message },
            StepError::DeadlineExceeded(_) => ApiError::Timeout { message },
            StepError::Panicked(_)
            | StepError::LookupPanicked
            | StepError::Encode(_)
            | StepError::Cancelled => ApiError::Internal { message },
        }
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(e: CollaboratorError) -> Self {
        ApiError::Upstream {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            ApiError::InvalidJson { message } => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_json",
                message,
            ),
            ApiError::InvalidInput { message } => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_input",
                message,
            ),
            ApiError::Upstream { message } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "collaborator_failed",
                message,
            ),
            ApiError::Timeout { message } => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout_error",
                "run_timeout",
                message,
            ),
            ApiError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "internal_error",
                message,
            ),
        };

        let body = ErrorResponse {
            error: ErrorObject {
                message,
                error_type: error_type.to_string(),
                code: code.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
