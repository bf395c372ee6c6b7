//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps certificate, course, and validation errors to HTTP status codes
//! with a JSON body of error code, message, and optional details.
//! Datastore and internal failures are logged but never described to the
//! client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lms_certs::CertificateError;
use lms_core::ValidationError;
use lms_courses::CourseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Input failed validation (422). `field` names the first failing field.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<&'static str>,
    },

    /// Request body or query could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (403).
    #[error("{0}")]
    Forbidden(String),

    /// Conflicts with an existing resource (409).
    #[error("{0}")]
    Conflict(String),

    /// Datastore unreachable or failing (503). Message is logged, not returned.
    #[error("datastore failure: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::ServiceUnavailable(_) => {
                tracing::warn!(error = %self, "datastore unavailable");
                "The service is temporarily unavailable. Please try again.".to_string()
            }
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            Self::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            field: Some(err.field().as_str()),
            message: err.to_string(),
        }
    }
}

impl From<CertificateError> for AppError {
    fn from(err: CertificateError) -> Self {
        match err {
            CertificateError::Validation(e) => e.into(),
            CertificateError::Duplicate { .. } => Self::Conflict(err.to_string()),
            CertificateError::Persistence(e) => Self::ServiceUnavailable(e.to_string()),
        }
    }
}

impl From<CourseError> for AppError {
    fn from(err: CourseError) -> Self {
        match err {
            CourseError::Unauthenticated => Self::Unauthorized(err.to_string()),
            CourseError::Validation(e) => e.into(),
            CourseError::Persistence(e) => Self::ServiceUnavailable(e.to_string()),
            CourseError::EmptyResult => Self::Internal(err.to_string()),
        }
    }
}
