//! Error type for source scanning and skeleton synthesis, and its bridge
//! into `PbtError`.

use easypbt_core::error::PbtError;
use thiserror::Error;

use crate::pattern::PatternKind;
use crate::validation::ValidationError;

/// Errors raised while reading or synthesizing Python source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The text is not well-formed Python.
    #[error("parse failure at line {line}: {message}")]
    Parse { message: String, line: u32 },

    /// The text contains no function definition.
    #[error("no function definition found")]
    NoFunctionDefinition,

    /// A named function does not exist in the source.
    #[error("function not found: {name}")]
    FunctionNotFound { name: String },

    /// A two-function pattern was synthesized without its second function.
    #[error("pattern {kind} requires a second function")]
    MissingSecondFunction { kind: PatternKind },

    /// The pattern is produced by the baseline generator, not locally.
    #[error("pattern {kind} is not synthesized locally")]
    NotBespoke { kind: PatternKind },

    /// A snippet template could not be compiled.
    #[error("invalid snippet template: {message}")]
    Template { message: String },
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// Create a parse failure at a 1-indexed line.
    pub fn parse(message: impl Into<String>, line: u32) -> Self {
        SourceError::Parse {
            message: message.into(),
            line,
        }
    }

    /// Create a function not found error.
    pub fn function_not_found(name: impl Into<String>) -> Self {
        SourceError::FunctionNotFound { name: name.into() }
    }

    pub(crate) fn template(err: regex::Error) -> Self {
        SourceError::Template {
            message: err.to_string(),
        }
    }

    /// The line a parse failure points at, if this is one.
    pub fn line(&self) -> Option<u32> {
        match self {
            SourceError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

// ============================================================================
// Bridges to PbtError
// ============================================================================

impl From<SourceError> for PbtError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Parse { message, line } => PbtError::ParseFailure { message, line },
            SourceError::NoFunctionDefinition => {
                PbtError::invalid_args("no function definition found")
            }
            SourceError::FunctionNotFound { name } => PbtError::FunctionNotFound { name },
            SourceError::MissingSecondFunction { kind } => PbtError::precondition(
                kind.ident(),
                "a second function (tester or oracle) is required",
            ),
            SourceError::NotBespoke { .. } | SourceError::Template { .. } => {
                PbtError::internal(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for PbtError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::InvalidName { name, reason } => PbtError::invalid_args_with_details(
                message,
                serde_json::json!({ "name": name, "reason": reason }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easypbt_core::error::OutputErrorCode;

    #[test]
    fn parse_errors_keep_their_line() {
        let err = PbtError::from(SourceError::parse("unterminated string literal", 4));
        match err {
            PbtError::ParseFailure { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_second_function_is_a_precondition_violation() {
        let err = PbtError::from(SourceError::MissingSecondFunction {
            kind: PatternKind::MetamorphicProp,
        });
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        assert!(err.to_string().contains("METAMORPHIC_PROP"));
    }

    #[test]
    fn function_not_found_is_a_resolution_error() {
        let err = PbtError::from(SourceError::function_not_found("sort_list"));
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }

    #[test]
    fn invalid_names_are_invalid_arguments() {
        let err = PbtError::from(ValidationError::InvalidName {
            name: "my-module".to_string(),
            reason: "invalid character: '-'".to_string(),
        });
        assert_eq!(err.error_code().code(), 2);
    }
}
