//! Editor snippet rendering.
//!
//! Skeletons carry two kinds of placeholders: `st.nothing()` where a
//! strategy must be chosen, and `${:hint}` where free text must be typed.
//! Rendering numbers both kinds left to right into editor tab stops,
//! turning each strategy placeholder into a choice menu. Stripping resolves
//! free-text placeholders to their hints so the text is plain Python again.

use regex::{Captures, Regex};

use crate::error::{SourceError, SourceResult};
use crate::rewrite::strip_imports;
use crate::synth::{text_placeholder, STRATEGY_PLACEHOLDER};

const PLACEHOLDER_PATTERN: &str = r"st\.nothing\(\)|\$\{\d*:([^}]*)\}";
const TEXT_PLACEHOLDER_PATTERN: &str = r"\$\{\d*:([^}]*)\}";

// ============================================================================
// Strategy catalog
// ============================================================================

/// A named strategy offered in the choice menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub name: String,
    pub expression: String,
}

/// Ordered strategies offered for each `st.nothing()` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyCatalog {
    strategies: Vec<Strategy>,
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        StrategyCatalog::new([
            ("integers", "st.integers()"),
            ("integers_bounded", "st.integers(min_value=-10, max_value=10)"),
            ("floats", "st.floats(allow_infinity=False, allow_nan=False)"),
            ("decimals", "st.decimals()"),
            ("strings", "st.text()"),
            ("strings_bounded", "st.text(min_size=0, max_size=10)"),
            ("booleans", "st.booleans()"),
            ("characters", "st.characters()"),
            ("lists_of_integers", "st.lists(st.integers())"),
            ("lists_of_strings", "st.lists(st.text())"),
            ("lists", "st.lists()"),
        ])
    }
}

impl StrategyCatalog {
    /// Build a catalog from `(name, expression)` pairs, in menu order.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        StrategyCatalog {
            strategies: entries
                .into_iter()
                .map(|(name, expression)| Strategy {
                    name: name.to_string(),
                    expression: expression.to_string(),
                })
                .collect(),
        }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Menu choices: expressions joined by `,` with inner commas escaped.
    pub fn menu_choices(&self) -> String {
        self.strategies
            .iter()
            .map(|s| s.expression.replace(',', "\\,"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Number every placeholder left to right.
///
/// `st.nothing()` becomes `${N|choice,...|}` and `${:hint}` (numbered or
/// not) becomes `${N:hint}`.
pub fn render_snippet(text: &str, catalog: &StrategyCatalog) -> SourceResult<String> {
    let pattern = Regex::new(PLACEHOLDER_PATTERN).map_err(SourceError::template)?;
    let menu = catalog.menu_choices();
    let mut stop = 0usize;

    let rendered = pattern.replace_all(text, |caps: &Captures<'_>| {
        stop += 1;
        match caps.get(1) {
            Some(hint) => format!("${{{}:{}}}", stop, hint.as_str()),
            None => format!("${{{}|{}|}}", stop, menu),
        }
    });
    Ok(rendered.into_owned())
}

/// Resolve every free-text placeholder to its hint.
///
/// `st.nothing()` is left in place so the result is runnable Python.
pub fn strip_placeholders(text: &str) -> SourceResult<String> {
    let pattern = Regex::new(TEXT_PLACEHOLDER_PATTERN).map_err(SourceError::template)?;
    Ok(pattern.replace_all(text, "$1").into_owned())
}

// ============================================================================
// Custom strategies
// ============================================================================

/// A `@given` argument and whether it needs a custom strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentFlag {
    pub name: String,
    pub custom: bool,
}

/// Name of the composite strategy stub for one argument.
pub fn custom_strategy_name(sut_name: &str, argument: &str) -> String {
    format!("{}_{}_strategy", sut_name.replace('.', "_"), argument)
}

/// Render a skeleton with composite strategy stubs for flagged arguments.
///
/// Each flagged argument gets an `@st.composite` stub, and its
/// `st.nothing()` binding in `@given` is replaced by a call to the stub.
/// Imports are stripped; the result is rendered as a snippet.
pub fn custom_strategy_snippet(
    pbt: &str,
    flags: &[ArgumentFlag],
    sut_name: &str,
    catalog: &StrategyCatalog,
) -> SourceResult<String> {
    let mut body = strip_imports(pbt)?;
    let mut stubs = String::new();

    for flag in flags.iter().filter(|f| f.custom) {
        let stub = custom_strategy_name(sut_name, &flag.name);
        stubs.push_str("@st.composite\n");
        stubs.push_str(&format!("def {}(draw):\n", stub));
        stubs.push_str(&format!(
            "    {}\n",
            text_placeholder(&format!("build a value for {} using draw", flag.name))
        ));
        stubs.push_str(&format!("    return draw({})\n\n\n", STRATEGY_PLACEHOLDER));

        let binding = Regex::new(&format!(
            r"\b{}(\s*)=(\s*){}",
            regex::escape(&flag.name),
            regex::escape(STRATEGY_PLACEHOLDER)
        ))
        .map_err(SourceError::template)?;
        let replacement = format!("{}=${{2}}{}()", flag.name, stub);
        body = binding.replace_all(&body, replacement.as_str()).into_owned();
    }

    render_snippet(&format!("{}{}", stubs, body), catalog)
}

// ============================================================================
// Examples
// ============================================================================

/// `@example(a=${1:"insert_value_here"}, ...)` for the given argument names.
pub fn example_snippet(arguments: &[String]) -> String {
    let values: Vec<String> = arguments
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}=${{{}:\"insert_value_here\"}}", name, i + 1))
        .collect();
    format!("@example({})", values.join(", "))
}

// ============================================================================
// Tests
// ============================================================================
