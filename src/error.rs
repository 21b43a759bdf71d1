//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every component fails fast with one of its variants and the HTTP boundary turns it
//! into a JSON body of the shape `{ "status": "error", "message": ... }`.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers and middleware
//! can simply return it. `From` implementations for `sqlx::Error` and
//! `actix_web::error::BlockingError` allow for easy conversion using the `?` operator.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use chrono::Utc;
use serde_json::json;
use std::fmt;

use crate::validation::Report;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// The request payload failed one or more validation rules (HTTP 400).
    /// Carries the field-keyed report that is rendered verbatim to the caller.
    ValidationFailed(Report),
    /// A malformed request that is not covered by a validation report (HTTP 400),
    /// e.g. unparsable JSON or query parameters.
    BadRequest(String),
    /// Authentication is missing or failed (HTTP 401).
    /// The message is deliberately generic.
    Unauthenticated(String),
    /// The caller is authenticated but lacks the required role (HTTP 403).
    Forbidden(String),
    /// The resource does not exist or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// The request collides with existing data, e.g. a duplicate email (HTTP 400).
    Conflict(String),
    /// An unexpected store or runtime failure (HTTP 500).
    /// The detail is logged, never sent to the client.
    Internal(String),
}

impl AppError {
    fn message(&self) -> &str {
        match self {
            AppError::ValidationFailed(_) => "Validation failed",
            AppError::BadRequest(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
            AppError::Internal(_) => "Internal server error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationFailed(report) => {
                write!(f, "Validation Failed: {} field(s) rejected", report.len())
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::ValidationFailed(report) => {
                HttpResponse::build(self.status_code()).json(json!({
                    "status": "error",
                    "message": self.message(),
                    "errors": report,
                    "timestamp": Utc::now(),
                }))
            }
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                HttpResponse::build(self.status_code()).json(json!({
                    "status": "error",
                    "message": self.message(),
                }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({
                "status": "error",
                "message": self.message(),
            })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`, unique-key violations to `Conflict`,
/// everything else to `Internal`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::Internal(format!("database error: {}", error)),
        }
    }
}

/// A closure sent to the blocking pool was cancelled or panicked.
impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::Internal(format!("blocking task failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthenticated("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Forbidden("Access denied".into());
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::NotFound("Todo not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::Conflict("User with this email already exists".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Internal("pool timed out".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_internal_error_hides_detail() {
        let response = AppError::Internal("connection refused on 10.0.0.3".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Internal server error");
    }

    #[actix_rt::test]
    async fn test_validation_error_renders_report() {
        let mut report = Report::default();
        report.add("title", "Title must be between 3 and 100 characters");

        let response = AppError::ValidationFailed(report).error_response();
        assert_eq!(response.status(), 400);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(
            json["errors"]["title"][0],
            "Title must be between 3 and 100 characters"
        );
        assert!(json["timestamp"].is_string());
    }
}
