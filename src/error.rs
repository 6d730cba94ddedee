//! Error handling module
//!
//! Provides unified error types and handling for the entire application.
//! Every kind below maps to its own HTTP status and code so the UI layer can
//! tell them apart without parsing messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Project name already exists: {0}")]
    DuplicateName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Missing prerequisite artifact: {0}")]
    MissingPrerequisite(String),

    #[error("Text generation timed out after {0}s")]
    Timeout(u64),

    #[error("Text generation failed: {0}")]
    ServiceError(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::DuplicateName(_) => "DUPLICATE_NAME",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidFormat(_) => "INVALID_FORMAT",
            AppError::MissingPrerequisite(_) => "MISSING_PREREQUISITE",
            AppError::Timeout(_) => "GENERATION_TIMEOUT",
            AppError::ServiceError(_) => "GENERATION_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                format!("A project named '{}' already exists", name),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::InvalidFormat(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Content could not be parsed".to_string(),
                Some(detail.clone()),
            ),
            AppError::MissingPrerequisite(artifact_type) => (
                StatusCode::PRECONDITION_FAILED,
                format!("Required artifact '{}' has not been saved yet", artifact_type),
                Some(artifact_type.clone()),
            ),
            AppError::Timeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Text generation did not finish within {}s", secs),
                None,
            ),
            AppError::ServiceError(msg) => (
                StatusCode::BAD_GATEWAY,
                "Text generation service failed".to_string(),
                Some(msg.clone()),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A configuration error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(self.code().to_string()),
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", e))
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_distinct_status() {
        let cases = [
            (AppError::DuplicateName("x".into()), StatusCode::CONFLICT),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidFormat("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::MissingPrerequisite("MCP_YAML".into()), StatusCode::PRECONDITION_FAILED),
            (AppError::Timeout(120), StatusCode::GATEWAY_TIMEOUT),
            (AppError::ServiceError("x".into()), StatusCode::BAD_GATEWAY),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::DuplicateName("a".into()).code(), "DUPLICATE_NAME");
        assert_eq!(AppError::Timeout(1).code(), "GENERATION_TIMEOUT");
        assert_eq!(
            AppError::MissingPrerequisite("PERF_REPORT".into()).code(),
            "MISSING_PREREQUISITE"
        );
    }
}
