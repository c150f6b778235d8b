//! Error bridge implementations for subsystem errors.
//!
//! This module provides `impl From<X> for PbtError` conversions from the
//! root crate's test-file and generator errors to the unified `PbtError`
//! type. The Python source errors bridge themselves in `easypbt-python`.
//!
//! These bridges live in the root crate rather than `easypbt-core` because
//! they depend on types (`TestFileError`, `GeneratorError`) that core does
//! not know about.

use std::io;

use easypbt_core::error::PbtError;
use easypbt_python::PatternKind;

use crate::generator::GeneratorError;
use crate::testfile::TestFileError;

// ============================================================================
// Bridge: TestFileError -> PbtError
// ============================================================================

impl From<TestFileError> for PbtError {
    fn from(err: TestFileError) -> Self {
        match err {
            TestFileError::NoModuleName { .. } => PbtError::invalid_args(err.to_string()),
            TestFileError::Read { ref path, ref source }
                if source.kind() == io::ErrorKind::NotFound =>
            {
                PbtError::file_not_found(path.display().to_string())
            }
            TestFileError::Read { .. } => PbtError::internal(err.to_string()),
            TestFileError::Write { ref path, .. } => PbtError::ApplyError {
                message: err.to_string(),
                file: Some(path.display().to_string()),
            },
        }
    }
}

// ============================================================================
// Bridge: GeneratorError -> PbtError
// ============================================================================

impl From<GeneratorError> for PbtError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::NotFound { ref program } => PbtError::invalid_args_with_details(
                err.to_string(),
                serde_json::json!({ "generator": program }),
            ),
            _ => PbtError::internal(err.to_string()),
        }
    }
}

/// Attach pattern and module context to a generator error.
///
/// Anything that went wrong after the program was located counts as a
/// generator failure for that request.
pub(crate) fn generator_failure(err: GeneratorError, kind: PatternKind, module: &str) -> PbtError {
    match err {
        GeneratorError::NotFound { .. } => PbtError::from(err),
        _ => PbtError::GeneratorFailed {
            pattern: kind.ident().to_string(),
            module: module.to_string(),
            message: err.to_string(),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
