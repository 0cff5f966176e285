//! Application error handling
//!
//! Every failure a handler can produce is an [`ApiError`]. At the request
//! boundary the error is turned into a field-keyed body by
//! [`field_errors`], so clients always receive
//! `{ "errors": { "<field>": "<message>" } }`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use library_catalog_shared::types::ErrorResponse;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error};
use validator::ValidationErrors;

/// A single failed schema rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("{entity} validation failed")]
    Validation {
        entity: &'static str,
        violations: Vec<FieldViolation>,
    },

    /// Unique constraint violated; carries the column name
    #[error("Duplicate value for {0}")]
    Conflict(String),

    #[error("Incorrect email")]
    IncorrectEmail,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Not found: {message}")]
    NotFound {
        field: &'static str,
        message: String,
    },

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Expand `validator` output into one violation per field
    pub fn from_validation(entity: &'static str, errors: &ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let field = field.to_string();
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldViolation { field, message }
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::Validation { entity, violations }
    }

    /// Request input that could not be decoded, reported under `field`
    fn malformed(field: &str, message: String) -> Self {
        debug!(field, message = %message, "Rejected malformed request");
        ApiError::Validation {
            entity: "request",
            violations: vec![FieldViolation {
                field: field.to_string(),
                message,
            }],
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PasswordMismatch
            | ApiError::Validation { .. }
            | ApiError::Conflict(_)
            | ApiError::IncorrectEmail
            | ApiError::IncorrectPassword
            | ApiError::NotFound { .. }
            | ApiError::InvalidToken => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::malformed("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::malformed("query", rejection.body_text())
    }
}

/// Message shown for a duplicate value in a known unique column
fn conflict_message(field: &str) -> Option<&'static str> {
    match field {
        "email" => Some("This email is already registered."),
        "isbn" => Some("A book with this ISBN already exists."),
        _ => None,
    }
}

/// Normalize an error into the field-keyed map sent to clients.
///
/// `email` and `password` are always present; a cause that is not
/// recognized leaves every field blank.
pub fn field_errors(err: &ApiError) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::from([
        ("email".to_string(), String::new()),
        ("password".to_string(), String::new()),
    ]);

    match err {
        ApiError::IncorrectEmail => {
            errors.insert("email".into(), "This email is not registered".into());
        }
        ApiError::IncorrectPassword => {
            errors.insert("password".into(), "This password is incorrect".into());
        }
        ApiError::Conflict(field) => {
            if let Some(message) = conflict_message(field) {
                errors.insert(field.clone(), message.into());
            }
        }
        ApiError::PasswordMismatch => {
            errors.insert("password".into(), "Password doesn't match!".into());
            errors.insert("confirmPassword".into(), "Password doesn't match!".into());
        }
        ApiError::Validation { violations, .. } => {
            for v in violations {
                errors.insert(v.field.clone(), v.message.clone());
            }
        }
        ApiError::NotFound { field, message } => {
            errors.insert((*field).to_string(), message.clone());
        }
        ApiError::InvalidToken => {
            errors.insert("token".into(), "Invalid or expired token".into());
        }
        ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) => {
            errors.insert("session".into(), msg.clone());
        }
        ApiError::Internal(_) | ApiError::Database(_) => {}
    }

    errors
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(err) => error!("Internal error: {:?}", err),
            ApiError::Database(err) => error!("Database error: {:?}", err),
            _ => {}
        }

        let body = Json(ErrorResponse {
            errors: field_errors(&self),
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
