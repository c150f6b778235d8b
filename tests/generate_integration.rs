//! End-to-end generation against temporary workspaces.
//!
//! The baseline generator is replaced by an in-memory fake, so these tests
//! need neither Python nor hypothesis.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use easypbt::cli::{run_example, run_functions, run_generate, GenerateOptions};
use easypbt::error::PbtError;
use easypbt::generate::SynthesisConfig;
use easypbt::generator::{BaselineGenerator, BaselineOutput, BaselineTarget, GeneratorError};

// ============================================================================
// Helpers
// ============================================================================

const MYMATH: &str = "\
def abs_(x):
    return x if x >= 0 else -x


def sin_(x):
    import math
    return math.sin(x)


class Stack:
    def push(self, item):
        self.items.append(item)
";

const CODEC: &str = "\
def encode(s):
    return s[::-1]


def decode(s):
    return s[::-1]
";

/// Fake generator: replays fixed output and counts calls.
struct FakeGenerator {
    stdout: String,
    stderr: String,
    calls: Cell<usize>,
}

impl FakeGenerator {
    fn ok(stdout: &str) -> Self {
        FakeGenerator {
            stdout: stdout.to_string(),
            stderr: String::new(),
            calls: Cell::new(0),
        }
    }

    fn failing(stderr: &str) -> Self {
        FakeGenerator {
            stdout: String::new(),
            stderr: stderr.to_string(),
            calls: Cell::new(0),
        }
    }
}

impl BaselineGenerator for FakeGenerator {
    fn generate(
        &self,
        _target: &BaselineTarget,
        _mode: Option<&str>,
    ) -> Result<BaselineOutput, GeneratorError> {
        self.calls.set(self.calls.get() + 1);
        Ok(BaselineOutput {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }
}

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn options(path: &Path, pattern: &str, functions: &[&str]) -> GenerateOptions {
    GenerateOptions {
        source_path: path.to_path_buf(),
        pattern: pattern.to_string(),
        functions: functions.iter().map(|f| f.to_string()).collect(),
        dry_run: false,
        append: false,
    }
}

fn generate_json(
    options: &GenerateOptions,
    baseline: &FakeGenerator,
) -> Result<serde_json::Value, PbtError> {
    let json = run_generate(options, &SynthesisConfig::default(), baseline)?;
    Ok(serde_json::from_str(&json).unwrap())
}

// ============================================================================
// Generate
// ============================================================================

#[test]
fn bespoke_generation_creates_missing_test_file() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let baseline = FakeGenerator::ok("");
    let source = dir.path().join("mymath.py");

    let response = generate_json(
        &options(&source, "SOME_THINGS_NEVER_CHANGE", &["abs_"]),
        &baseline,
    )
    .unwrap();

    assert_eq!(response["status"], "ok");
    assert_eq!(response["written"], true);
    assert_eq!(response["function_parameters"], serde_json::json!(["x"]));
    assert!(response["pbt"]
        .as_str()
        .unwrap()
        .contains("assert (x,) == output"));
    assert_eq!(baseline.calls.get(), 0);

    let test_file = fs::read_to_string(dir.path().join("mymath_test.py")).unwrap();
    assert!(test_file.starts_with("import unittest\n"));
    assert!(test_file.contains("import mymath\n"));
    assert!(test_file.contains("hypothesis.extra.ghostwriter"));
}

#[test]
fn generation_preserves_existing_tests() {
    let existing = "\
import unittest


class TestHandWritten(unittest.TestCase):
    def test_zero(self):
        self.assertEqual(0, 0)
";
    let dir = workspace(&[("mymath.py", MYMATH), ("mymath_test.py", existing)]);
    let source = dir.path().join("mymath.py");

    generate_json(
        &options(&source, "WITHIN_EXPECTED_BOUNDS", &["sin_"]),
        &FakeGenerator::ok(""),
    )
    .unwrap();

    let test_file = fs::read_to_string(dir.path().join("mymath_test.py")).unwrap();
    assert!(test_file.contains("class TestHandWritten(unittest.TestCase):"));
    assert!(test_file.contains("        self.assertEqual(0, 0)\n"));
    assert_eq!(test_file.matches("import unittest\n").count(), 1);
    assert!(test_file.contains("from hypothesis import given, strategies as st\n"));
}

#[test]
fn generating_twice_does_not_duplicate_imports_or_banner() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");
    let request = options(&source, "SOME_THINGS_NEVER_CHANGE", &["abs_"]);

    generate_json(&request, &FakeGenerator::ok("")).unwrap();
    let first = fs::read_to_string(dir.path().join("mymath_test.py")).unwrap();
    generate_json(&request, &FakeGenerator::ok("")).unwrap();
    let second = fs::read_to_string(dir.path().join("mymath_test.py")).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.matches("ghostwriter").count(), 1);
}

#[test]
fn append_writes_the_skeleton_body() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");
    let mut request = options(&source, "WITHIN_EXPECTED_BOUNDS", &["sin_"]);
    request.append = true;

    let response = generate_json(&request, &FakeGenerator::ok("")).unwrap();

    let test_file = fs::read_to_string(dir.path().join("mymath_test.py")).unwrap();
    assert_eq!(response["test_file"].as_str().unwrap(), test_file);
    assert!(test_file.contains("class TestOutputsWithinExpectedBoundsSin_(unittest.TestCase):"));
    assert!(!test_file.contains("${"));
    assert!(response["pbt_snippet"].as_str().unwrap().contains("${1|"));
}

#[test]
fn dry_run_writes_nothing() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");
    let mut request = options(&source, "SOME_THINGS_NEVER_CHANGE", &["Stack.push"]);
    request.dry_run = true;

    let response = generate_json(&request, &FakeGenerator::ok("")).unwrap();

    assert_eq!(response["written"], false);
    assert!(response["pbt"]
        .as_str()
        .unwrap()
        .contains("output = mymath.Stack.push(item=item)"));
    assert!(!dir.path().join("mymath_test.py").exists());
}

#[test]
fn baseline_output_is_merged_verbatim() {
    let generated = "\
# This test code was written by the `hypothesis.extra.ghostwriter` module
# and is provided under the Creative Commons Zero public domain dedication.

import codec
from hypothesis import given, strategies as st


@given(s=st.text())
def test_roundtrip_encode_decode(s):
    value0 = codec.encode(s=s)
    value1 = codec.decode(s=value0)
    assert s == value1, (s, value1)
";
    let dir = workspace(&[("codec.py", CODEC)]);
    let baseline = FakeGenerator::ok(generated);
    let source = dir.path().join("codec.py");

    let mut request = options(&source, "roundtrip", &["encode", "decode"]);
    request.append = true;

    let response = generate_json(&request, &baseline).unwrap();

    assert_eq!(baseline.calls.get(), 1);
    assert_eq!(response["pbt"], generated);
    assert_eq!(response["function_parameters"], serde_json::json!(["s"]));
    let test_file = fs::read_to_string(dir.path().join("codec_test.py")).unwrap();
    assert!(test_file.starts_with("import codec\nfrom hypothesis import given, strategies as st\n"));
    assert!(test_file.contains("def test_roundtrip_encode_decode(s):"));
    assert_eq!(test_file.matches("ghostwriter").count(), 1);
}

#[test]
fn generator_failure_leaves_test_file_untouched() {
    let dir = workspace(&[("codec.py", CODEC), ("codec_test.py", "import os\n")]);
    let source = dir.path().join("codec.py");

    let err = generate_json(
        &options(&source, "TEST_ORACLE", &["encode", "decode"]),
        &FakeGenerator::failing("Error: boom\n"),
    )
    .unwrap_err();

    assert_eq!(err.error_code().code(), 5);
    assert_eq!(
        fs::read_to_string(dir.path().join("codec_test.py")).unwrap(),
        "import os\n"
    );
}

#[test]
fn two_function_pattern_with_one_function_is_rejected() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");

    let err = generate_json(
        &options(&source, "METAMORPHIC_PROP", &["abs_"]),
        &FakeGenerator::ok(""),
    )
    .unwrap_err();

    assert!(matches!(err, PbtError::PreconditionViolation { .. }));
    assert!(!dir.path().join("mymath_test.py").exists());
}

#[test]
fn unknown_function_is_reported() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");

    let err = generate_json(
        &options(&source, "SOME_THINGS_NEVER_CHANGE", &["cos_"]),
        &FakeGenerator::ok(""),
    )
    .unwrap_err();

    assert!(matches!(err, PbtError::FunctionNotFound { ref name } if name == "cos_"));
}

#[test]
fn unknown_pattern_is_invalid_arguments() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");

    let err = generate_json(&options(&source, "fuzzy", &["abs_"]), &FakeGenerator::ok(""))
        .unwrap_err();

    assert_eq!(err.error_code().code(), 2);
}

#[test]
fn malformed_source_is_a_parse_failure() {
    let dir = workspace(&[("broken.py", "def f(x:\n    return x\n")]);
    let source = dir.path().join("broken.py");

    let err = generate_json(
        &options(&source, "SOME_THINGS_NEVER_CHANGE", &["f"]),
        &FakeGenerator::ok(""),
    )
    .unwrap_err();

    assert_eq!(err.error_code().code(), 6);
}

// ============================================================================
// Functions and examples
// ============================================================================

#[test]
fn functions_lists_methods_with_qualified_names() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let json = run_functions(&dir.path().join("mymath.py")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let names: Vec<&str> = value["functions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["abs_", "sin_", "Stack.push"]);
    assert_eq!(value["module"], "mymath");
}

#[test]
fn example_adds_import_and_locates_test() {
    let dir = workspace(&[("mymath.py", MYMATH)]);
    let source = dir.path().join("mymath.py");
    let mut request = options(&source, "SOME_THINGS_NEVER_CHANGE", &["abs_"]);
    request.append = true;
    generate_json(&request, &FakeGenerator::ok("")).unwrap();
    let test_path = dir.path().join("mymath_test.py");

    let json = run_example(
        &test_path,
        "TestSomeThingsNeverChangeAbs_.test_some_things_never_change_abs_",
        &SynthesisConfig::default(),
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["snippet"], "@example(x=${1:\"insert_value_here\"})");
    assert_eq!(value["refresh"], true);
    assert_eq!(value["location"]["col"], 4);

    let test_file = fs::read_to_string(&test_path).unwrap();
    assert!(test_file.contains("from hypothesis import given, strategies as st, example\n"));
    let line = value["location"]["line"].as_u64().unwrap() as usize;
    assert_eq!(
        test_file.lines().nth(line - 1).unwrap().trim(),
        "@given(x=st.nothing())"
    );

    // Second request: the import is already there
    let json = run_example(
        &test_path,
        "TestSomeThingsNeverChangeAbs_.test_some_things_never_change_abs_",
        &SynthesisConfig::default(),
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["refresh"], false);
}

#[test]
fn failed_example_requests_leave_the_test_file_untouched() {
    let original = "\
import os  # keep me
from hypothesis import given, strategies as st


@given(x=st.integers())
def test_a(x):
    pass


def test_plain():
    pass
";
    let dir = workspace(&[("mymath_test.py", original)]);
    let test_path = dir.path().join("mymath_test.py");

    let err = run_example(&test_path, "test_nope", &SynthesisConfig::default()).unwrap_err();
    assert!(matches!(err, PbtError::FunctionNotFound { .. }));
    assert_eq!(fs::read_to_string(&test_path).unwrap(), original);

    let err = run_example(&test_path, "test_plain", &SynthesisConfig::default()).unwrap_err();
    assert_eq!(err.error_code().code(), 2);
    assert_eq!(fs::read_to_string(&test_path).unwrap(), original);
}

#[test]
fn example_column_counts_a_tab_as_one_character() {
    let tabbed = "\
from hypothesis import example, given, strategies as st


class TestTabs:
\t@given(x=st.integers())
\tdef test_tab(self, x):
\t\tpass
";
    let dir = workspace(&[("tabs_test.py", tabbed)]);
    let test_path = dir.path().join("tabs_test.py");

    let json = run_example(&test_path, "TestTabs.test_tab", &SynthesisConfig::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["refresh"], false);
    assert_eq!(value["location"]["line"], 5);
    assert_eq!(value["location"]["col"], 1);
}
