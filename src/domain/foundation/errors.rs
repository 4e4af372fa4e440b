//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    DuplicatePlaceholder,
    UnknownPlaceholder,
    NoPlaceholders,

    // Not found errors
    SessionNotFound,

    // State errors
    SessionComplete,
    PlaceholderAlreadyFilled,

    // Infrastructure errors
    StorageError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::DuplicatePlaceholder => "DUPLICATE_PLACEHOLDER",
            ErrorCode::UnknownPlaceholder => "UNKNOWN_PLACEHOLDER",
            ErrorCode::NoPlaceholders => "NO_PLACEHOLDERS",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::SessionComplete => "SESSION_COMPLETE",
            ErrorCode::PlaceholderAlreadyFilled => "PLACEHOLDER_ALREADY_FILLED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates an error for a key that names no placeholder in the session.
    pub fn unknown_placeholder(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::UnknownPlaceholder,
            format!("No placeholder with key '{}'", key),
        )
        .with_detail("key", key)
    }

    /// Creates an error for a mutation attempted on a completed session.
    pub fn session_complete() -> Self {
        Self::new(
            ErrorCode::SessionComplete,
            "Session is complete and can no longer be modified",
        )
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
