//! Unified error handling for Folia
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Storage Errors ====================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ==================== Business Logic Errors ====================
    #[error("Insufficient credits: {available} available")]
    InsufficientCredits { available: u32 },

    #[error("Monthly adjustment quota exceeded: {remaining} credits remaining this month")]
    QuotaExceeded { remaining: u32 },

    #[error("Session conflict: {0}")]
    SessionConflict(String),

    #[error("Could not record adjustment: {0}")]
    AdjustmentNotRecorded(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            // 402 Payment Required
            AppError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::QuotaExceeded { .. } | AppError::SessionConflict(_) => StatusCode::CONFLICT,

            // 503 Service Unavailable (transient, caller may retry)
            AppError::AdjustmentNotRecorded(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "storage_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::InsufficientCredits { .. } => "insufficient_credits",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::SessionConflict(_) => "session_conflict",
            AppError::AdjustmentNotRecorded(_) => "adjustment_not_recorded",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        // Actionable figures the UI must render verbatim
        match self {
            AppError::QuotaExceeded { remaining } => {
                body["remaining"] = json!(remaining);
            }
            AppError::InsufficientCredits { available } => {
                body["available"] = json!(available);
            }
            _ => {}
        }

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InsufficientCredits { available: 0 }.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::QuotaExceeded { remaining: 8 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::AdjustmentNotRecorded("disk full".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Validation("reason too short".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::QuotaExceeded { remaining: 0 }.error_code(),
            "quota_exceeded"
        );
        assert_eq!(
            AppError::SessionConflict("s1".to_string()).error_code(),
            "session_conflict"
        );
    }

    #[test]
    fn test_quota_exceeded_message_carries_remaining() {
        let err = AppError::QuotaExceeded { remaining: 8 };
        assert!(err.to_string().contains('8'));
    }
}
