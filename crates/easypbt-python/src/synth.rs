//! Bespoke test-skeleton synthesis.
//!
//! Produces a complete `unittest` test module for the patterns the baseline
//! generator has no mode for. Every strategy is left as `st.nothing()` and
//! every spot the user must fill in is an unnumbered `'${:hint}'`
//! placeholder; the snippet renderer numbers them in reading order.

use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::extract::SutSignature;
use crate::pattern::{Dispatch, PatternKind};

/// Strategy placeholder the renderer turns into a strategy menu.
pub const STRATEGY_PLACEHOLDER: &str = "st.nothing()";

/// Name of the extra argument drawn for metamorphic properties.
const EXTRA_ARGUMENT: &str = "extraArg";

/// What a skeleton is synthesized for.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonRequest<'a> {
    /// Importable module name of the source file.
    pub module: &'a str,
    /// The system under test.
    pub sut: &'a SutSignature,
    /// Second function (tester, oracle) for two-function patterns.
    pub partner: Option<&'a str>,
}

/// Synthesize the skeleton for a bespoke pattern kind.
pub fn synthesize(kind: PatternKind, request: &SkeletonRequest<'_>) -> SourceResult<String> {
    if kind.dispatch() != Dispatch::Bespoke {
        return Err(SourceError::NotBespoke { kind });
    }
    let partner = || request.partner.ok_or(SourceError::MissingSecondFunction { kind });

    let skeleton = match kind {
        PatternKind::SomeThingsNeverChange => some_things_never_change(request),
        PatternKind::SolveSmallerProblemFirst => solve_smaller_problem_first(request),
        PatternKind::HardToProve => hard_to_prove(request, partner()?),
        PatternKind::WithinExpectedBounds => within_expected_bounds(request),
        PatternKind::MetamorphicProp => metamorphic_property(request, partner()?),
        _ => return Err(SourceError::NotBespoke { kind }),
    };

    debug!(pattern = %kind, sut = %request.sut.qualified_name, "synthesized skeleton");
    Ok(skeleton)
}

/// `Test<Pattern><Function>`, e.g. `TestSomeThingsNeverChangeStackPush`.
pub fn test_class_name(kind: PatternKind, qualified_name: &str) -> String {
    format!("Test{}{}", camel_case(kind.name()), class_suffix(qualified_name))
}

/// A free-text placeholder as a Python string literal.
pub fn text_placeholder(hint: &str) -> String {
    format!("'${{:{}}}'", hint)
}

// ============================================================================
// Patterns
// ============================================================================

fn some_things_never_change(request: &SkeletonRequest<'_>) -> String {
    let mut w = SkeletonWriter::new(request.module, PatternKind::SomeThingsNeverChange, request.sut);
    w.test_method("test_some_things_never_change", &[]);
    w.call_sut("output");
    w.line(2, &format!("assert {} == output", tuple_of(&request.sut.parameters)));
    w.finish()
}

fn within_expected_bounds(request: &SkeletonRequest<'_>) -> String {
    let mut w = SkeletonWriter::new(request.module, PatternKind::WithinExpectedBounds, request.sut);
    w.test_method("test_within_expected_bounds", &[]);
    w.line(
        2,
        &format!(
            "lowerBound, upperBound = {}, {}",
            text_placeholder("lowerBound"),
            text_placeholder("upperBound")
        ),
    );
    w.call_sut("output");
    w.line(2, "assert lowerBound <= output and output <= upperBound");
    w.finish()
}

fn hard_to_prove(request: &SkeletonRequest<'_>, tester: &str) -> String {
    let mut w = SkeletonWriter::new(request.module, PatternKind::HardToProve, request.sut);
    w.test_method("test_hard_to_prove_easy_to_verify", &[]);
    w.call_sut("output");
    w.line(2, &format!("assert {}.{}(output) == True", request.module, tester));
    w.finish()
}

fn solve_smaller_problem_first(request: &SkeletonRequest<'_>) -> String {
    let mut w = SkeletonWriter::new(
        request.module,
        PatternKind::SolveSmallerProblemFirst,
        request.sut,
    );
    w.helper(
        "isCorrect(self, element)",
        &[text_placeholder("enter code here to test an element"), "pass".to_string()],
    );
    w.helper(
        "isDone(self, element)",
        &[
            text_placeholder("enter code here that returns True if the element is empty"),
            "pass".to_string(),
        ],
    );
    w.helper(
        "getNextElement(self, element)",
        &[
            text_placeholder("enter code here that returns the next element"),
            "pass".to_string(),
        ],
    );
    w.test_method("test_solve_smaller_problem_first", &[]);
    w.call_sut("output");
    w.blank();
    w.line(2, "currentElement = output");
    w.line(2, "while not self.isDone(currentElement):");
    w.line(3, "assert self.isCorrect(currentElement)");
    w.line(3, "currentElement = self.getNextElement(currentElement)");
    w.finish()
}

fn metamorphic_property(request: &SkeletonRequest<'_>, oracle: &str) -> String {
    let mut w = SkeletonWriter::new(request.module, PatternKind::MetamorphicProp, request.sut);
    w.helper(
        &format!("holdsMetamorphicProperty(self, sutOutput, oracleOutput, {})", EXTRA_ARGUMENT),
        &[
            "\"\"\"Compare the outputs based on the metamorphic property\"\"\"".to_string(),
            format!(
                "return {}",
                text_placeholder("sutOutput(extraArg) == oracleOutput(extraArg)")
            ),
        ],
    );
    w.test_method("test_metamorphic_property", &[EXTRA_ARGUMENT]);
    w.call_sut("sutOutput");
    w.line(
        2,
        &format!(
            "oracleOutput = {}.{}({})",
            request.module,
            oracle,
            keyword_arguments(&request.sut.parameters)
        ),
    );
    w.blank();
    w.line(
        2,
        "# extra arguments must also be drawn in @given and accepted by holdsMetamorphicProperty",
    );
    w.line(2, &format!("extraArguments = [{}]", EXTRA_ARGUMENT));
    w.line(
        2,
        "isCorrect = self.holdsMetamorphicProperty(sutOutput, oracleOutput, *extraArguments)",
    );
    w.blank();
    w.line(2, "assert isCorrect == True");
    w.finish()
}

// ============================================================================
// Writer
// ============================================================================

/// Accumulates a skeleton module line by line.
struct SkeletonWriter<'a> {
    out: String,
    module: &'a str,
    sut: &'a SutSignature,
}

impl<'a> SkeletonWriter<'a> {
    /// Start a module: imports, then the test class header.
    fn new(module: &'a str, kind: PatternKind, sut: &'a SutSignature) -> Self {
        let mut out = String::new();
        out.push_str("import unittest\n");
        out.push_str("from hypothesis import given, strategies as st\n");
        out.push_str(&format!("import {}\n\n\n", module));
        out.push_str(&format!(
            "class {}(unittest.TestCase):\n",
            test_class_name(kind, &sut.qualified_name)
        ));
        SkeletonWriter { out, module, sut }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// A helper method the user completes.
    fn helper(&mut self, signature: &str, body: &[String]) {
        self.blank();
        self.line(1, &format!("def {}:", signature));
        for line in body {
            self.line(2, line);
        }
    }

    /// The `@given` decorated test method header.
    fn test_method(&mut self, prefix: &str, extra: &[&str]) {
        let mut drawn: Vec<&str> = self.sut.parameters.iter().map(String::as_str).collect();
        drawn.extend_from_slice(extra);

        let given: Vec<String> = drawn
            .iter()
            .map(|name| format!("{}={}", name, STRATEGY_PLACEHOLDER))
            .collect();
        let mut params = vec!["self"];
        params.extend(drawn.iter().copied());

        self.blank();
        self.line(1, &format!("@given({})", given.join(", ")));
        self.line(
            1,
            &format!(
                "def {}_{}({}):",
                prefix,
                self.sut.qualified_name.replace('.', "_"),
                params.join(", ")
            ),
        );
    }

    /// `<target> = module.sut(a=a, ...)`
    fn call_sut(&mut self, target: &str) {
        let call = format!(
            "{} = {}.{}({})",
            target,
            self.module,
            self.sut.qualified_name,
            keyword_arguments(&self.sut.parameters)
        );
        self.line(2, &call);
    }

    fn finish(self) -> String {
        self.out
    }
}

fn keyword_arguments(parameters: &[String]) -> String {
    parameters
        .iter()
        .map(|p| format!("{}={}", p, p))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A Python tuple expression of the names: `()`, `(x,)`, `(x, y)`.
fn tuple_of(parameters: &[String]) -> String {
    match parameters {
        [] => "()".to_string(),
        [only] => format!("({},)", only),
        many => format!("({})", many.join(", ")),
    }
}

/// "Some Things Never Change" -> "SomeThingsNeverChange".
fn camel_case(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect()
}

/// "Stack.push" -> "StackPush".
fn class_suffix(qualified: &str) -> String {
    qualified.split('.').map(capitalize).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
