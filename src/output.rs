//! JSON response types for the CLI.
//!
//! The envelope types (`ErrorResponse`, `SCHEMA_VERSION`, emission helpers)
//! come from `easypbt-core`; the responses here carry Python-specific
//! payloads such as pattern catalog entries and function descriptors.
//!
//! Every response serializes `status` first, then `schema_version`.

use serde::{Deserialize, Serialize};

use easypbt_python::{FunctionDescriptor, PatternInfo};

pub use easypbt_core::output::{
    emit_response, emit_response_compact, ErrorInfo, ErrorResponse, Location, SCHEMA_VERSION,
};

fn ok_status() -> (String, String) {
    ("ok".to_string(), SCHEMA_VERSION.to_string())
}

// ============================================================================
// Catalog
// ============================================================================

/// Response for `easypbt patterns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsResponse {
    pub status: String,
    pub schema_version: String,
    pub patterns: Vec<PatternInfo>,
}

impl PatternsResponse {
    pub fn new(patterns: Vec<PatternInfo>) -> Self {
        let (status, schema_version) = ok_status();
        PatternsResponse {
            status,
            schema_version,
            patterns,
        }
    }
}

/// Response for `easypbt functions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsResponse {
    pub status: String,
    pub schema_version: String,
    /// Source file as given.
    pub file: String,
    /// Module name derived from the file name.
    pub module: String,
    pub functions: Vec<FunctionDescriptor>,
}

impl FunctionsResponse {
    pub fn new(file: String, module: String, functions: Vec<FunctionDescriptor>) -> Self {
        let (status, schema_version) = ok_status();
        FunctionsResponse {
            status,
            schema_version,
            file,
            module,
            functions,
        }
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Response for `easypbt generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    pub schema_version: String,
    /// The requested pattern.
    pub pattern: PatternInfo,
    pub module: String,
    /// Functions the skeleton was generated for, in request order.
    pub functions: Vec<String>,
    /// The generated test module.
    pub pbt: String,
    /// The skeleton without imports, as an editor snippet.
    pub pbt_snippet: String,
    /// Path of the test file.
    pub test_file_path: String,
    /// Full content of the rewritten test file.
    pub test_file: String,
    /// Keyword names of the skeleton's first `@given` clause.
    pub function_parameters: Vec<String>,
    /// Whether the test file was written (false for dry runs).
    pub written: bool,
}

/// Response for `easypbt snippet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetResponse {
    pub status: String,
    pub schema_version: String,
    pub snippet: String,
}

impl SnippetResponse {
    pub fn new(snippet: String) -> Self {
        let (status, schema_version) = ok_status();
        SnippetResponse {
            status,
            schema_version,
            snippet,
        }
    }
}

/// Response for `easypbt example`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleResponse {
    pub status: String,
    pub schema_version: String,
    /// The `@example(...)` decorator as an editor snippet.
    pub snippet: String,
    /// Where to insert the decorator: the test's first line and indentation.
    pub location: Location,
    /// True when the test file was rewritten to import `example`.
    pub refresh: bool,
}

impl ExampleResponse {
    pub fn new(snippet: String, location: Location, refresh: bool) -> Self {
        let (status, schema_version) = ok_status();
        ExampleResponse {
            status,
            schema_version,
            snippet,
            location,
            refresh,
        }
    }
}
