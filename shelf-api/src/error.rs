//! Error Types for the Shelf API
//!
//! - `ErrorCode` categorizes failures and maps each to an HTTP status
//! - `ApiError` is the JSON error body returned by every endpoint
//! - `From<ShelfError>` translates domain failures, keeping the kind and the
//!   offending fields in `details`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shelf_core::{ShelfError, StorageError};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation Errors (400)
    /// Submitted fields failed validation
    ValidationFailed,

    /// Request could not be interpreted
    InvalidInput,

    /// Field format is incorrect
    InvalidFormat,

    // Not Found Errors (404)
    EntityNotFound,

    // Conflict Errors (409)
    EntityAlreadyExists,

    // Throttling (429)
    TooManyRequests,

    // Server Errors (500)
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::TooManyRequests => "Rate limit exceeded",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Error kind and per-field breakdown, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Sent as the `Retry-After` header, not in the body
    #[serde(skip)]
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retry_after_secs: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    pub fn too_many_requests(retry_after_secs: Option<u64>) -> Self {
        let message = match retry_after_secs {
            Some(secs) => format!("Rate limit exceeded. Retry after {} seconds", secs),
            None => "Rate limit exceeded".to_string(),
        };
        Self {
            retry_after_secs,
            ..Self::new(ErrorCode::TooManyRequests, message)
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = self.retry_after_secs;
        let mut response = (status, Json(self)).into_response();

        if let Some(secs) = retry_after {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from_str(&secs.to_string())
                    .unwrap_or_else(|_| HeaderValue::from_static("60")),
            );
        }

        response
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<ShelfError> for ApiError {
    fn from(err: ShelfError) -> Self {
        let kind = err.kind();
        match &err {
            ShelfError::Validation(v) => ApiError::validation_failed(v.to_string()).with_details(
                serde_json::json!({ "kind": kind, "fields": v.violations() }),
            ),
            ShelfError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::entity_not_found(entity_type.as_str(), id)
                    .with_details(serde_json::json!({ "kind": kind }))
            }
            ShelfError::Storage(StorageError::InsertFailed { .. }) => {
                ApiError::new(ErrorCode::EntityAlreadyExists, err.to_string())
                    .with_details(serde_json::json!({ "kind": kind }))
            }
            ShelfError::RateLimitExceeded {
                policy,
                retry_after_secs,
            } => ApiError::too_many_requests(Some(*retry_after_secs))
                .with_details(serde_json::json!({ "kind": kind, "policy": policy })),
            ShelfError::Storage(_) | ShelfError::Cache(_) | ShelfError::Config(_) => {
                // Log the full error, return a generic one
                tracing::error!(error = %err, "Internal error");
                ApiError::from_code(ErrorCode::InternalError)
                    .with_details(serde_json::json!({ "kind": kind }))
            }
        }
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format("id", &format!("valid UUID: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::{EntityType, ReviewInput, ValidationError};

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::EntityNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::TooManyRequests.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_lists_every_field() {
        let err: ShelfError = ReviewInput::new("short", 9).validate().unwrap_err().into();
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::ValidationFailed);

        let details = api.details.unwrap();
        assert_eq!(details["kind"], "validation");
        let fields: Vec<_> = details["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["text", "rating"]);
    }

    #[test]
    fn test_malformed_window_bound_names_field() {
        let err: ShelfError = ValidationError::MalformedTimestamp {
            field: "from".to_string(),
            value: "yesterday".to_string(),
        }
        .into();
        let api: ApiError = err.into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(api.details.unwrap()["fields"][0]["field"], "from");
    }

    #[test]
    fn test_not_found_mapping() {
        let id = uuid::Uuid::now_v7();
        let api: ApiError = ShelfError::not_found(EntityType::Book, id).into();
        assert_eq!(api.code, ErrorCode::EntityNotFound);
        assert!(api.message.contains(&id.to_string()));
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let api: ApiError = ShelfError::RateLimitExceeded {
            policy: "reviews".to_string(),
            retry_after_secs: 1200,
        }
        .into();
        assert_eq!(api.retry_after_secs, Some(1200));

        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1200");
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let api: ApiError = ShelfError::Storage(StorageError::LockPoisoned).into();
        assert_eq!(api.code, ErrorCode::InternalError);
        assert_eq!(api.message, "Internal server error");
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::too_many_requests(Some(5));
        let json = serde_json::to_value(&err)?;
        assert_eq!(json["code"], "TOO_MANY_REQUESTS");
        assert!(json.get("retry_after_secs").is_none());
        assert!(json.get("details").is_none());
        Ok(())
    }
}
