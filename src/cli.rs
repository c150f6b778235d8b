//! CLI front door.
//!
//! Each `run_*` function performs one command and returns its JSON response
//! as a string; `main.rs` only parses arguments, prints and maps errors to
//! exit codes. Keeping the commands here makes them callable from tests
//! without spawning the binary.
//!
//! ## Error Handling
//!
//! All functions return `Result<String, PbtError>`. The `PbtError` type
//! provides stable error codes for JSON output.

use std::path::{Path, PathBuf};

use easypbt_core::error::PbtError;
use easypbt_python::extract::list_functions;
use easypbt_python::pattern::{pattern_catalog, PatternKind, UnknownPattern};

use crate::generate::{self, GenerateRequest, SynthesisConfig};
use crate::generator::BaselineGenerator;
use crate::output::{
    ExampleResponse, FunctionsResponse, GenerateResponse, PatternsResponse, SnippetResponse,
    SCHEMA_VERSION,
};
use crate::testfile;

fn to_json<T: serde::Serialize>(response: &T) -> Result<String, PbtError> {
    serde_json::to_string_pretty(response)
        .map_err(|e| PbtError::internal(format!("failed to serialize response: {}", e)))
}

/// List the pattern catalog.
pub fn run_patterns() -> Result<String, PbtError> {
    to_json(&PatternsResponse::new(pattern_catalog()))
}

/// List the functions (and class methods) defined in a source file.
pub fn run_functions(path: &Path) -> Result<String, PbtError> {
    let module = testfile::module_name(path)?;
    let source = testfile::read_source(path)?;
    let functions = list_functions(&source)?;
    to_json(&FunctionsResponse::new(
        path.display().to_string(),
        module,
        functions,
    ))
}

/// Options for [`run_generate`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub source_path: PathBuf,
    /// Pattern id, identifier or kebab-case name.
    pub pattern: String,
    pub functions: Vec<String>,
    pub dry_run: bool,
    pub append: bool,
}

/// Generate a skeleton and merge it into the test file.
pub fn run_generate(
    options: &GenerateOptions,
    config: &SynthesisConfig,
    baseline: &dyn BaselineGenerator,
) -> Result<String, PbtError> {
    let pattern = options
        .pattern
        .parse::<PatternKind>()
        .map_err(|e: UnknownPattern| {
            PbtError::invalid_args_with_details(
                e.to_string(),
                serde_json::json!({ "pattern": options.pattern }),
            )
        })?;

    let request = GenerateRequest {
        source_path: options.source_path.clone(),
        pattern,
        functions: options.functions.clone(),
        dry_run: options.dry_run,
        append_skeleton: options.append,
    };
    let generated = generate::generate(&request, config, baseline)?;

    to_json(&GenerateResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        pattern: generated.pattern.info(),
        module: generated.module,
        functions: generated.functions,
        pbt: generated.pbt,
        pbt_snippet: generated.pbt_snippet,
        test_file_path: generated.test_file_path.display().to_string(),
        test_file: generated.test_file,
        function_parameters: generated.function_parameters,
        written: generated.written,
    })
}

/// Render a generated skeleton as a snippet, optionally with composite
/// strategy stubs.
pub fn run_snippet(
    pbt_file: &Path,
    sut: &str,
    custom: &[String],
    config: &SynthesisConfig,
) -> Result<String, PbtError> {
    let pbt = testfile::read_source(pbt_file)?;
    let snippet = generate::strategy_snippet(&pbt, sut, custom, config)?;
    to_json(&SnippetResponse::new(snippet))
}

/// Build an `@example` decorator for a test.
pub fn run_example(
    test_file: &Path,
    test_name: &str,
    config: &SynthesisConfig,
) -> Result<String, PbtError> {
    let example = generate::example_snippet(test_file, test_name, config)?;
    to_json(&ExampleResponse::new(
        example.snippet,
        example.location,
        example.refresh,
    ))
}
