//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use biblio_core::LibraryError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, database, record)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// Acting member lacks the role for the operation
    PermissionDenied(String),

    /// Integrity check failed
    IntegrityFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                if hint.is_empty() {
                    write!(f, "{}", message)
                } else {
                    write!(f, "{}\n{}", message, hint)
                }
            }
            CliError::InvalidInput(message)
            | CliError::PermissionDenied(message)
            | CliError::IntegrityFailed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        CliError::PermissionDenied(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::PermissionDenied(_) => exit_codes::PERMISSION_DENIED,
            CliError::IntegrityFailed(_) => exit_codes::INTEGRITY_FAILED,
        }
    }
}

/// Exit code for a core error.
pub fn library_exit_code(err: &LibraryError) -> i32 {
    match err {
        LibraryError::DatabaseNotFound(_) => exit_codes::NOT_FOUND,
        e if e.is_not_found() => exit_codes::NOT_FOUND,
        LibraryError::PermissionDenied(_) => exit_codes::PERMISSION_DENIED,
        e if e.is_refusal() => exit_codes::REFUSED,
        LibraryError::Validation(_) | LibraryError::Json { .. } => exit_codes::INVALID_INPUT,
        _ => 1,
    }
}

/// Exit code for an error surfaced from a command handler.
///
/// Typed errors keep their code; anything else is a general failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if let Some(lib) = err.downcast_ref::<LibraryError>() {
        return library_exit_code(lib);
    }
    1
}
