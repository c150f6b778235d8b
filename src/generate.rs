//! Pattern dispatch and test-file generation.
//!
//! A request names a source file, a pattern and one or two functions. The
//! pattern's dispatch decides where the skeleton comes from:
//!
//! - bespoke patterns are synthesized locally from the function signature
//! - baseline patterns are delegated to the external generator, whose output
//!   is used verbatim
//! - "different paths, same destination" stages the source as a placeholder
//!   module, runs the generator's binary-operation mode on it and reshapes
//!   the result into a test class for the real module
//!
//! The skeleton's imports are merged into the test file's imports and the
//! file is rewritten around them. Nothing is written unless every step
//! succeeded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use easypbt_core::config::ResolvedConfig;
use easypbt_core::error::PbtError;
use easypbt_core::output::Location;
use easypbt_python::extract::{self, SutSignature};
use easypbt_python::imports::{parse_imports, ImportEntry, ImportStructure, MaybeAlias};
use easypbt_python::pattern::{Dispatch, PatternKind};
use easypbt_python::postprocess::wrap_binary_operation;
use easypbt_python::snippet::{self, ArgumentFlag, StrategyCatalog};
use easypbt_python::synth::{self, SkeletonRequest};
use easypbt_python::validation::{validate_function_reference, validate_python_identifier};
use easypbt_python::Rewriter;

use crate::error_bridges::generator_failure;
use crate::generator::{BaselineGenerator, BaselineTarget};
use crate::testfile;

/// Module name the source is staged under for the binary-operation mode.
pub const DEFAULT_PLACEHOLDER_MODULE: &str = "auxiliary";

// ============================================================================
// Configuration
// ============================================================================

/// Explicit settings for skeleton synthesis and file rewriting.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Suffix inserted before `.py` in the test file name.
    pub test_suffix: String,
    /// Module the source is staged as for the binary-operation mode and
    /// renamed to the real module when post-processing.
    pub placeholder_module: String,
    /// Strategies offered in snippet menus.
    pub catalog: StrategyCatalog,
    /// Rewriter (and its banner) used for test files.
    pub rewriter: Rewriter,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        SynthesisConfig {
            test_suffix: easypbt_core::config::DEFAULT_TEST_SUFFIX.to_string(),
            placeholder_module: DEFAULT_PLACEHOLDER_MODULE.to_string(),
            catalog: StrategyCatalog::default(),
            rewriter: Rewriter::default(),
        }
    }
}

impl SynthesisConfig {
    /// Settings derived from resolved configuration.
    pub fn from_resolved(config: &ResolvedConfig) -> Self {
        SynthesisConfig {
            test_suffix: config.test_suffix.value.clone(),
            ..SynthesisConfig::default()
        }
    }
}

// ============================================================================
// Generate
// ============================================================================

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// The Python file containing the functions.
    pub source_path: PathBuf,
    pub pattern: PatternKind,
    /// System under test first, then the tester or oracle if any.
    pub functions: Vec<String>,
    /// Compute everything but leave the test file untouched.
    pub dry_run: bool,
    /// Also append the skeleton body to the test file.
    pub append_skeleton: bool,
}

/// Everything a generation request produced.
#[derive(Debug, Clone)]
pub struct Generated {
    pub pattern: PatternKind,
    pub module: String,
    pub functions: Vec<String>,
    /// The generated test module.
    pub pbt: String,
    /// The skeleton body as an editor snippet.
    pub pbt_snippet: String,
    pub test_file_path: PathBuf,
    /// Rewritten test file content.
    pub test_file: String,
    /// Keyword names of the skeleton's first `@given`.
    pub function_parameters: Vec<String>,
    pub written: bool,
}

/// Run a generation request end to end.
pub fn generate(
    request: &GenerateRequest,
    config: &SynthesisConfig,
    baseline: &dyn BaselineGenerator,
) -> Result<Generated, PbtError> {
    let kind = request.pattern;
    let module = testfile::module_name(&request.source_path)?;
    validate_python_identifier(&module)?;
    check_functions(kind, &request.functions)?;

    let source = testfile::read_source(&request.source_path)?;
    let listed = extract::list_functions(&source)?;
    for name in &request.functions {
        if !listed.iter().any(|f| &f.name == name) {
            return Err(PbtError::function_not_found(name.clone()));
        }
    }

    let working_dir = source_dir(&request.source_path);
    let pbt = skeleton(
        kind,
        &module,
        &source,
        &request.functions,
        &working_dir,
        config,
        baseline,
    )?;

    let test_file_path = testfile::test_file_path(&request.source_path, &config.test_suffix)?;
    let existing = testfile::read_test_file(&test_file_path)?;
    let test_file = merge_into_test_file(&existing, &pbt, request.append_skeleton, config)?;

    let pbt_snippet =
        snippet::render_snippet(&config.rewriter.strip_imports(&pbt)?, &config.catalog)?;
    let function_parameters = extract::given_arguments(&pbt)?;

    let written = !request.dry_run;
    if written {
        testfile::write_atomic(&test_file_path, &test_file)?;
        info!(
            pattern = %kind,
            module = %module,
            path = %test_file_path.display(),
            "updated test file"
        );
    } else {
        debug!(path = %test_file_path.display(), "dry run, test file not written");
    }

    Ok(Generated {
        pattern: kind,
        module,
        functions: request.functions.clone(),
        pbt,
        pbt_snippet,
        test_file_path,
        test_file,
        function_parameters,
        written,
    })
}

/// Produce the skeleton for `functions` according to the pattern's dispatch.
///
/// The functions are assumed to exist in `source`; see [`generate`].
pub fn skeleton(
    kind: PatternKind,
    module: &str,
    source: &str,
    functions: &[String],
    working_dir: &Path,
    config: &SynthesisConfig,
    baseline: &dyn BaselineGenerator,
) -> Result<String, PbtError> {
    check_functions(kind, functions)?;
    let dispatch = kind.dispatch();
    debug!(pattern = %kind, ?dispatch, module, "dispatching");

    match dispatch {
        Dispatch::Bespoke => {
            let sut: SutSignature = extract::sut_signature(source, &functions[0])?;
            let request = SkeletonRequest {
                module,
                sut: &sut,
                partner: functions.get(1).map(String::as_str),
            };
            Ok(synth::synthesize(kind, &request)?)
        }
        Dispatch::Baseline { mode } => {
            let target = BaselineTarget {
                module: module.to_string(),
                functions: functions.to_vec(),
                working_dir: working_dir.to_path_buf(),
                import_paths: Vec::new(),
            };
            run_baseline(kind, module, &target, mode, baseline)
        }
        Dispatch::BaselinePostProcessed { mode } => {
            // The generator sees the source as the placeholder module; the
            // scratch directory lives until the output is wrapped.
            let staged = stage_placeholder(source, &config.placeholder_module)?;
            let target = BaselineTarget {
                module: config.placeholder_module.clone(),
                functions: vec![functions[0].clone()],
                working_dir: staged.path().to_path_buf(),
                import_paths: vec![working_dir.to_path_buf()],
            };
            let generated = run_baseline(kind, module, &target, Some(mode), baseline)?;
            Ok(wrap_binary_operation(
                &generated,
                module,
                &functions[0],
                &config.placeholder_module,
            )?)
        }
    }
}

/// Run the generator for `target`. Failures are reported against `module`,
/// the module the user asked about.
fn run_baseline(
    kind: PatternKind,
    module: &str,
    target: &BaselineTarget,
    mode: Option<&str>,
    baseline: &dyn BaselineGenerator,
) -> Result<String, PbtError> {
    let output = baseline
        .generate(target, mode)
        .map_err(|e| generator_failure(e, kind, module))?;

    if output.failed() {
        warn!(
            pattern = %kind,
            module,
            stderr = %output.stderr.trim_end(),
            "generator reported an error"
        );
        return Err(PbtError::GeneratorFailed {
            pattern: kind.ident().to_string(),
            module: module.to_string(),
            message: output.stderr.trim_end().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Copy `source` into a fresh scratch directory as `<placeholder>.py`.
fn stage_placeholder(source: &str, placeholder: &str) -> Result<TempDir, PbtError> {
    validate_python_identifier(placeholder)?;
    let staging_failed =
        |e: io::Error| PbtError::internal(format!("failed to stage placeholder module: {}", e));
    let dir = TempDir::with_prefix("easypbt_").map_err(staging_failed)?;
    let path = dir.path().join(format!("{}.py", placeholder));
    fs::write(&path, source).map_err(staging_failed)?;
    debug!(path = %path.display(), "staged placeholder module");
    Ok(dir)
}

/// Validate the function list against the pattern.
fn check_functions(kind: PatternKind, functions: &[String]) -> Result<(), PbtError> {
    if functions.is_empty() {
        return Err(PbtError::precondition(
            kind.ident(),
            "at least one function is required",
        ));
    }
    if kind.requires_two_functions() && functions.len() < 2 {
        return Err(PbtError::precondition(
            kind.ident(),
            "two functions are required: the function under test and its counterpart",
        ));
    }
    for name in functions {
        validate_function_reference(name)?;
    }
    Ok(())
}

fn source_dir(source_path: &Path) -> PathBuf {
    match source_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Rewrite `existing` around the union of its imports and the skeleton's.
fn merge_into_test_file(
    existing: &str,
    pbt: &str,
    append_skeleton: bool,
    config: &SynthesisConfig,
) -> Result<String, PbtError> {
    let merged: ImportStructure = parse_imports(existing)?.union(&parse_imports(pbt)?);

    let content = if append_skeleton {
        let body = snippet::strip_placeholders(&config.rewriter.strip_imports(pbt)?)?;
        format!("{}\n\n\n{}", existing.trim_end(), body.trim_start())
    } else {
        existing.to_string()
    };

    Ok(config.rewriter.rewrite(&content, &merged)?)
}

// ============================================================================
// Snippets
// ============================================================================

/// Render a skeleton as a snippet, with composite strategy stubs for the
/// arguments named in `custom`.
pub fn strategy_snippet(
    pbt: &str,
    sut_name: &str,
    custom: &[String],
    config: &SynthesisConfig,
) -> Result<String, PbtError> {
    let arguments = extract::given_arguments(pbt)?;
    if let Some(unknown) = custom.iter().find(|c| !arguments.contains(c)) {
        return Err(PbtError::invalid_args_with_details(
            format!("'{}' is not an argument of the @given clause", unknown),
            serde_json::json!({ "argument": unknown, "arguments": arguments }),
        ));
    }

    let flags: Vec<ArgumentFlag> = arguments
        .into_iter()
        .map(|name| ArgumentFlag {
            custom: custom.contains(&name),
            name,
        })
        .collect();
    Ok(snippet::custom_strategy_snippet(
        pbt,
        &flags,
        sut_name,
        &config.catalog,
    )?)
}

/// An `@example` decorator for a test and where to put it.
#[derive(Debug, Clone)]
pub struct ExampleSnippet {
    pub snippet: String,
    pub location: Location,
    /// The test file was rewritten to import `example`.
    pub refresh: bool,
}

/// Build an `@example(...)` snippet for `test_name` in the test file.
///
/// If the file does not import `example` from hypothesis yet, the import is
/// merged in and the location refers to the rewritten file. The file is
/// written only once the test is found and has `@given` arguments.
pub fn example_snippet(
    test_path: &Path,
    test_name: &str,
    config: &SynthesisConfig,
) -> Result<ExampleSnippet, PbtError> {
    validate_function_reference(test_name)?;
    let mut content = testfile::read_source(test_path)?;

    let imports = parse_imports(&content)?;
    let refresh = !imports.contains_name("hypothesis", "example");
    if refresh {
        let example: ImportStructure = std::iter::once(ImportEntry::from_names(
            MaybeAlias::new("hypothesis"),
            [MaybeAlias::new("example")],
        ))
        .collect();
        content = config.rewriter.rewrite(&content, &imports.union(&example))?;
    }

    let site = extract::find_function(&content, test_name)?
        .ok_or_else(|| PbtError::function_not_found(test_name))?;
    let arguments = site.given_arguments();
    if arguments.is_empty() {
        return Err(PbtError::invalid_args_with_details(
            format!("test '{}' has no @given arguments", test_name),
            serde_json::json!({ "test": test_name }),
        ));
    }

    if refresh {
        testfile::write_atomic(test_path, &content)?;
        info!(path = %test_path.display(), "added hypothesis.example import");
    }

    Ok(ExampleSnippet {
        snippet: snippet::example_snippet(&arguments),
        location: Location::new(test_path.display().to_string(), site.line, site.column),
        refresh,
    })
}

// ============================================================================
// Tests
// ============================================================================
