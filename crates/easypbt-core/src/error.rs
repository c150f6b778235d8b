//! Error types and error code constants for easypbt.
//!
//! This module provides a unified error type (`PbtError`) that bridges
//! domain-specific errors from the different subsystems (source scanning,
//! external generator, test-file I/O) into a common format suitable for
//! JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input or violated request precondition)
//! - `3`: Resolution errors (function not found, file not found)
//! - `4`: Apply errors (failed to write the test file)
//! - `5`: External generator failed (non-empty error channel, timeout)
//! - `6`: Parse failure (malformed source text)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `PbtError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for PbtError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, violated precondition).
    InvalidArguments = 2,
    /// Resolution errors (function not found, file not found).
    ResolutionError = 3,
    /// Apply errors (failed to write the test file).
    ApplyError = 4,
    /// The external baseline generator reported an error.
    GeneratorFailed = 5,
    /// Source text could not be parsed.
    ParseFailure = 6,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// Each variant carries enough context (module, function, pattern) for the
/// caller to log it and surface it to the end user.
#[derive(Debug, Error)]
pub enum PbtError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A request precondition does not hold (e.g. a two-function pattern
    /// requested with a single function).
    #[error("precondition violated for pattern '{pattern}': {message}")]
    PreconditionViolation { pattern: String, message: String },

    /// Malformed source text.
    #[error("parse failure at line {line}: {message}")]
    ParseFailure { message: String, line: u32 },

    /// A named function could not be found in the source.
    #[error("function not found: {name}")]
    FunctionNotFound { name: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The external baseline generator reported an error.
    #[error("generator failed for {module} (pattern '{pattern}'): {message}")]
    GeneratorFailed {
        pattern: String,
        module: String,
        message: String,
    },

    /// Failed to write the test file.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&PbtError> for OutputErrorCode {
    fn from(err: &PbtError) -> Self {
        match err {
            PbtError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            PbtError::PreconditionViolation { .. } => OutputErrorCode::InvalidArguments,
            PbtError::ParseFailure { .. } => OutputErrorCode::ParseFailure,
            PbtError::FunctionNotFound { .. } => OutputErrorCode::ResolutionError,
            PbtError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            PbtError::GeneratorFailed { .. } => OutputErrorCode::GeneratorFailed,
            PbtError::ApplyError { .. } => OutputErrorCode::ApplyError,
            PbtError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<PbtError> for OutputErrorCode {
    fn from(err: PbtError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl PbtError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        PbtError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        PbtError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a precondition violation for a pattern.
    pub fn precondition(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        PbtError::PreconditionViolation {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a function not found error.
    pub fn function_not_found(name: impl Into<String>) -> Self {
        PbtError::FunctionNotFound { name: name.into() }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        PbtError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        PbtError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
