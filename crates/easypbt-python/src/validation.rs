//! Python name validation.
//!
//! Module names derived from file names and function names supplied by the
//! caller end up verbatim in generated code and generator command lines, so
//! they are checked before use.

use thiserror::Error;

/// Error for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Invalid Python identifier.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Python keywords that cannot be used as identifiers.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Check if a name is a Python keyword.
pub fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Validate that a string is a valid Python identifier.
///
/// ```
/// use easypbt_python::validation::validate_python_identifier;
///
/// assert!(validate_python_identifier("abs_").is_ok());
/// assert!(validate_python_identifier("2fast").is_err());
/// assert!(validate_python_identifier("lambda").is_err());
/// ```
pub fn validate_python_identifier(name: &str) -> ValidationResult<()> {
    let invalid = |reason: String| ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| invalid("name cannot be empty".to_string()))?;
    if !first.is_alphabetic() && first != '_' {
        return Err(invalid("must start with letter or underscore".to_string()));
    }
    if let Some(ch) = chars.find(|ch| !ch.is_alphanumeric() && *ch != '_') {
        return Err(invalid(format!("invalid character: '{}'", ch)));
    }
    if is_python_keyword(name) {
        return Err(invalid("cannot use Python keyword as identifier".to_string()));
    }
    Ok(())
}

/// Validate a function reference: `name` or `Class.method`.
pub fn validate_function_reference(name: &str) -> ValidationResult<()> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() > 2 {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "expected `function` or `Class.method`".to_string(),
        });
    }
    for segment in segments {
        validate_python_identifier(segment).map_err(|_| ValidationError::InvalidName {
            name: name.to_string(),
            reason: format!("'{}' is not a valid identifier", segment),
        })?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
