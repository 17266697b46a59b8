//! Structured error types for engine operations.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Auth errors
    InvalidCredentials,
    PasswordMismatch,

    // Not found errors
    UserNotFound,
    TaskNotFound,
    TableNotFound,
    DocNotFound,

    // Internal errors
    StorageError,
    InternalError,
}

/// Structured error surfaced by the engine.
///
/// The only errors that reach the presentation layer come from the auth flow;
/// persistence failures inside actions are logged and swallowed.
#[derive(Debug, Error, Serialize)]
#[error("{message}")]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid login or password")
    }

    pub fn password_mismatch() -> Self {
        Self::new(ErrorCode::PasswordMismatch, "Passwords do not match")
    }

    pub fn user_not_found(login: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("User not found: {}", login),
        )
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn table_not_found(table_id: &str) -> Self {
        Self::new(
            ErrorCode::TableNotFound,
            format!("Table not found: {}", table_id),
        )
    }

    pub fn doc_not_found(doc_id: &str) -> Self {
        Self::new(ErrorCode::DocNotFound, format!("Doc not found: {}", doc_id))
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EngineError>() {
            Ok(engine_err) => engine_err,
            Err(err) => EngineError::internal(err),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
