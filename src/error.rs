/// Unified error types for the registrar service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors (missing/expired/invalid credential)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors (wrong role, not the resource owner)
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g. duplicate registration, duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business-rule state errors (course inactive, has active enrollments)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Course capacity reached
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                self.to_string(),
            ),
            ApiError::Authorization(_) => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                self.to_string(),
            ),
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "ValidationFailed",
                self.to_string(),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            ApiError::Conflict(_) => (
                StatusCode::BAD_REQUEST,
                "Conflict",
                self.to_string(),
            ),
            ApiError::InvalidState(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidState",
                self.to_string(),
            ),
            ApiError::CapacityExceeded(_) => (
                StatusCode::BAD_REQUEST,
                "CapacityExceeded",
                self.to_string(),
            ),
            ApiError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            ApiError::Database(_) | ApiError::Internal(_) | ApiError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ServerError",
                // Detail stays in debug builds, production gets the generic line
                if cfg!(debug_assertions) {
                    self.to_string()
                } else {
                    "Internal server error".to_string()
                },
            ),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

/// Flatten validator's per-field errors into a single message
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut parts: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let detail = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                format!("{}: {}", field, detail)
            })
            .collect();
        parts.sort();
        ApiError::Validation(parts.join("; "))
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::NotFound("course".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("already registered".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::CapacityExceeded("course is full".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Authentication("missing token".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Authorization("admin only".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
