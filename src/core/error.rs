//! Error type system for the phonebook backend
//!
//! Provides a single error enum with HTTP status code mapping and an
//! `IntoResponse` implementation so handlers can return `Result<_>`
//! directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Main error type for the phonebook backend
#[derive(Debug, thiserror::Error)]
pub enum PhonebookError {
    // System-level errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task error: {0}")]
    Task(String),

    // Request validation
    #[error("{0}")]
    Validation(String),

    // Authentication. Both variants carry fixed messages on purpose:
    // every gate rejection must be indistinguishable from the outside,
    // and login must not reveal whether the email or the password was
    // wrong.
    #[error("Not authorized")]
    NotAuthorized,

    #[error("Email or password is wrong")]
    WrongCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    // Collaborator failures
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Image error: {0}")]
    Image(String),
}

impl PhonebookError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PhonebookError::Validation(_) => StatusCode::BAD_REQUEST,

            PhonebookError::NotAuthorized | PhonebookError::WrongCredentials => {
                StatusCode::UNAUTHORIZED
            }

            PhonebookError::NotFound(_) => StatusCode::NOT_FOUND,

            PhonebookError::Conflict(_) => StatusCode::CONFLICT,

            PhonebookError::Config(_)
            | PhonebookError::Database(_)
            | PhonebookError::Io(_)
            | PhonebookError::Task(_)
            | PhonebookError::PasswordHash(_)
            | PhonebookError::Token(_)
            | PhonebookError::Email(_)
            | PhonebookError::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for log entries
    pub fn error_type(&self) -> &'static str {
        match self {
            PhonebookError::Config(_) => "Config",
            PhonebookError::Database(_) => "Database",
            PhonebookError::Io(_) => "Io",
            PhonebookError::Task(_) => "Task",
            PhonebookError::Validation(_) => "Validation",
            PhonebookError::NotAuthorized => "NotAuthorized",
            PhonebookError::WrongCredentials => "WrongCredentials",
            PhonebookError::Conflict(_) => "Conflict",
            PhonebookError::NotFound(_) => "NotFound",
            PhonebookError::PasswordHash(_) => "PasswordHash",
            PhonebookError::Token(_) => "Token",
            PhonebookError::Email(_) => "Email",
            PhonebookError::Image(_) => "Image",
        }
    }
}

/// Error response body for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for PhonebookError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Result type alias for operations that can fail with PhonebookError
pub type Result<T> = std::result::Result<T, PhonebookError>;
