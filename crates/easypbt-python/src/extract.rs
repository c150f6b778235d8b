// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Function discovery and signature extraction.
//!
//! Functions are found at module level and directly inside module-level
//! classes; a method is named `Class.method`. Anything nested deeper
//! (functions inside functions, nested classes) is not a candidate system
//! under test.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::outline::{Outline, Statement, StatementKind};
use crate::syntax;

// ============================================================================
// Function descriptors
// ============================================================================

/// A function or method the user can pick as system under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// `name` or `Class.method`.
    pub name: String,
    /// Line of the `def` (1-indexed).
    pub line_start: u32,
    /// Last non-blank line of the body (1-indexed).
    pub line_end: u32,
    /// Enclosing class, empty for module-level functions.
    #[serde(rename = "class")]
    pub class_name: String,
    /// Method name, empty for module-level functions.
    #[serde(rename = "method")]
    pub method_name: String,
}

/// The calling convention of a system under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SutSignature {
    /// `name` or `Class.method`.
    pub qualified_name: String,
    /// Keyword-passable parameters in declaration order, without `self`.
    pub parameters: Vec<String>,
}

impl SutSignature {
    /// The last dotted segment (the function or method name).
    pub fn function_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

/// List module-level functions and methods of module-level classes.
///
/// When a name is defined twice the first definition wins.
pub fn list_functions(source: &str) -> SourceResult<Vec<FunctionDescriptor>> {
    let outline = Outline::parse(source)?;
    let mut functions: Vec<FunctionDescriptor> = Vec::new();

    let mut push = |descriptor: FunctionDescriptor| {
        if !functions.iter().any(|f| f.name == descriptor.name) {
            functions.push(descriptor);
        }
    };

    for stmt in &outline.statements {
        match &stmt.kind {
            StatementKind::Def { name } => push(FunctionDescriptor {
                name: name.clone(),
                line_start: outline.start_line(stmt),
                line_end: outline.end_line(stmt),
                class_name: String::new(),
                method_name: String::new(),
            }),
            StatementKind::Class { name: class } => {
                for method in &stmt.body {
                    if let StatementKind::Def { name } = &method.kind {
                        push(FunctionDescriptor {
                            name: format!("{}.{}", class, name),
                            line_start: outline.start_line(method),
                            line_end: outline.end_line(method),
                            class_name: class.clone(),
                            method_name: name.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    debug!(count = functions.len(), "listed functions");
    Ok(functions)
}

/// Parameters of the first function defined in `source`.
///
/// Only parameters that can be passed by keyword are returned, in
/// declaration order; a leading `self` is dropped. Positional-only,
/// keyword-only, `*args` and `**kwargs` parameters are excluded.
pub fn get_parameters(source: &str) -> SourceResult<Vec<String>> {
    let outline = Outline::parse(source)?;
    let stmt =
        first_def(&outline.statements).ok_or(SourceError::NoFunctionDefinition)?;
    def_parameters(&outline, stmt)
}

/// Source text for each requested name.
///
/// A plain name yields the function's definition; a dotted name yields the
/// whole enclosing class. Names that cannot be found are skipped.
pub fn get_sut_source_list(source: &str, names: &[String]) -> SourceResult<Vec<String>> {
    let outline = Outline::parse(source)?;
    let mut sources = Vec::new();

    for name in names {
        let found = match name.split_once('.') {
            Some((class, _)) => find_class(&outline.statements, class),
            None => find_top_level_def(&outline.statements, name),
        };
        match found {
            Some(stmt) => sources.push(source[outline.span(stmt)].to_string()),
            None => debug!(name = %name, "no source for function"),
        }
    }

    Ok(sources)
}

/// Signature of `name` (`f` or `Class.method`) in `source`.
pub fn sut_signature(source: &str, name: &str) -> SourceResult<SutSignature> {
    let outline = Outline::parse(source)?;
    let stmt = find_qualified(&outline.statements, name)
        .ok_or_else(|| SourceError::function_not_found(name))?;
    Ok(SutSignature {
        qualified_name: name.to_string(),
        parameters: def_parameters(&outline, stmt)?,
    })
}

// ============================================================================
// Function sites
// ============================================================================

/// Where a (test) function sits in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSite {
    /// Line of the first decorator, or of the `def` when undecorated.
    pub line: u32,
    /// Character offset of the first decorator (or the `def`) in its line.
    /// A tab counts as one character.
    pub column: u32,
    /// Decorator lines, normalized.
    pub decorators: Vec<String>,
    /// The function's source, decorators included.
    pub source: String,
}

impl FunctionSite {
    /// Keyword names of the first `@given(...)` decorator.
    pub fn given_arguments(&self) -> Vec<String> {
        self.decorators
            .iter()
            .find_map(|d| syntax::given_keywords(d))
            .unwrap_or_default()
    }
}

/// Locate a function by name.
///
/// `Class.method` is looked up in that class. A bare name is looked up at
/// module level first, then among the methods of module-level classes.
pub fn find_function(source: &str, name: &str) -> SourceResult<Option<FunctionSite>> {
    let outline = Outline::parse(source)?;
    let stmt = match name.split_once('.') {
        Some(_) => find_qualified(&outline.statements, name),
        None => find_top_level_def(&outline.statements, name).or_else(|| {
            outline
                .statements
                .iter()
                .filter(|s| matches!(s.kind, StatementKind::Class { .. }))
                .find_map(|class| find_top_level_def(&class.body, name))
        }),
    };

    Ok(stmt.map(|stmt| {
        let first = &outline.lines[stmt.first];
        let leading = first
            .raw
            .chars()
            .take_while(|c| matches!(c, ' ' | '\t' | '\x0c'))
            .count();
        FunctionSite {
            line: first.start_line,
            column: u32::try_from(leading).unwrap_or(u32::MAX),
            decorators: outline.decorators(stmt).map(|l| l.code.clone()).collect(),
            source: source[outline.span(stmt)].to_string(),
        }
    }))
}

/// Keyword names of the first `@given(...)` found in `source`.
pub fn given_arguments(source: &str) -> SourceResult<Vec<String>> {
    let outline = Outline::parse(source)?;
    let names = outline
        .lines
        .iter()
        .find_map(|line| syntax::given_keywords(&line.code))
        .unwrap_or_default();
    Ok(names)
}

// ============================================================================
// Lookup helpers
// ============================================================================

fn def_parameters(outline: &Outline<'_>, stmt: &Statement) -> SourceResult<Vec<String>> {
    let line = outline.header(stmt);
    let header = syntax::parse_def_header(&line.code)
        .map_err(|message| SourceError::parse(message, line.start_line))?;
    Ok(header.keyword_parameters())
}

fn first_def(statements: &[Statement]) -> Option<&Statement> {
    statements.iter().find_map(|stmt| match stmt.kind {
        StatementKind::Def { .. } => Some(stmt),
        _ => first_def(&stmt.body),
    })
}

fn find_top_level_def<'s>(statements: &'s [Statement], name: &str) -> Option<&'s Statement> {
    statements
        .iter()
        .find(|s| matches!(&s.kind, StatementKind::Def { name: n } if n == name))
}

fn find_class<'s>(statements: &'s [Statement], name: &str) -> Option<&'s Statement> {
    statements
        .iter()
        .find(|s| matches!(&s.kind, StatementKind::Class { name: n } if n == name))
}

fn find_qualified<'s>(statements: &'s [Statement], name: &str) -> Option<&'s Statement> {
    match name.split_once('.') {
        Some((class, method)) => {
            find_class(statements, class).and_then(|c| find_top_level_def(&c.body, method))
        }
        None => find_top_level_def(statements, name),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = "\
import math


def abs_(x):
    if x < 0:
        return -x
    return x


class Stack:
    def __init__(self):
        self.items = []

    @property
    def top(self):
        return self.items[-1]

    def push(self, item, *, copy=False):
        self.items.append(item)


async def fetch(url, /, timeout, **kw):
    pass

def abs_(y):
    return y
";

    mod listing {
        use super::*;

        #[test]
        fn lists_functions_and_methods() {
            let functions = list_functions(MODULE).unwrap();
            let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(
                names,
                vec!["abs_", "Stack.__init__", "Stack.top", "Stack.push", "fetch"]
            );
        }

        #[test]
        fn line_spans_cover_the_body() {
            let functions = list_functions(MODULE).unwrap();
            assert_eq!(functions[0].line_start, 4);
            assert_eq!(functions[0].line_end, 7);
            let top = &functions[2];
            assert_eq!(top.line_start, 15);
            assert_eq!(top.line_end, 16);
            assert_eq!(top.class_name, "Stack");
            assert_eq!(top.method_name, "top");
        }

        #[test]
        fn first_definition_wins() {
            let functions = list_functions(MODULE).unwrap();
            assert_eq!(functions.iter().filter(|f| f.name == "abs_").count(), 1);
            assert_eq!(functions[0].line_start, 4);
        }

        #[test]
        fn descriptor_serializes_class_and_method_keys() {
            let functions = list_functions("class A:\n    def m(self):\n        pass\n").unwrap();
            let json = serde_json::to_value(&functions[0]).unwrap();
            assert_eq!(json["name"], "A.m");
            assert_eq!(json["class"], "A");
            assert_eq!(json["method"], "m");
        }

        #[test]
        fn no_functions() {
            assert!(list_functions("x = 1\n").unwrap().is_empty());
        }
    }

    mod parameters {
        use super::*;

        #[test]
        fn first_function_parameters() {
            assert_eq!(get_parameters(MODULE).unwrap(), vec!["x"]);
        }

        #[test]
        fn method_parameters_drop_self() {
            let params = get_parameters("    def push(self, item):\n        pass\n");
            // indented text is not a module: the first line is an unexpected indent
            assert!(params.is_err());
            let params = get_parameters("def push(self, item, *, copy=False):\n    pass\n").unwrap();
            assert_eq!(params, vec!["item"]);
        }

        #[test]
        fn nested_def_is_found() {
            let params = get_parameters("class A:\n    def m(self, a, b):\n        pass\n").unwrap();
            assert_eq!(params, vec!["a", "b"]);
        }

        #[test]
        fn no_definition() {
            assert_eq!(
                get_parameters("x = 1\n").unwrap_err(),
                SourceError::NoFunctionDefinition
            );
        }

        #[test]
        fn signature_of_method() {
            let sig = sut_signature(MODULE, "Stack.push").unwrap();
            assert_eq!(sig.parameters, vec!["item"]);
            assert_eq!(sig.function_name(), "push");
        }

        #[test]
        fn signature_excludes_special_parameters() {
            let sig = sut_signature(MODULE, "fetch").unwrap();
            assert_eq!(sig.parameters, vec!["timeout"]);
        }

        #[test]
        fn signature_of_missing_function() {
            let err = sut_signature(MODULE, "Stack.pop").unwrap_err();
            assert_eq!(err, SourceError::function_not_found("Stack.pop"));
        }
    }

    mod sources {
        use super::*;

        #[test]
        fn plain_names_yield_function_source() {
            let sources = get_sut_source_list(MODULE, &["abs_".to_string()]).unwrap();
            assert_eq!(
                sources,
                vec!["def abs_(x):\n    if x < 0:\n        return -x\n    return x\n"]
            );
        }

        #[test]
        fn dotted_names_yield_class_source() {
            let sources = get_sut_source_list(MODULE, &["Stack.push".to_string()]).unwrap();
            assert_eq!(sources.len(), 1);
            assert!(sources[0].starts_with("class Stack:\n"));
            assert!(sources[0].contains("def push"));
        }

        #[test]
        fn missing_names_are_skipped() {
            let names = vec!["nope".to_string(), "fetch".to_string()];
            let sources = get_sut_source_list(MODULE, &names).unwrap();
            assert_eq!(sources.len(), 1);
            assert!(sources[0].starts_with("async def fetch"));
        }
    }

    mod sites {
        use super::*;

        const TESTS: &str = "\
import unittest


class TestRoundtrip(unittest.TestCase):

    @given(x=st.integers(), y=st.text())
    @settings(max_examples=5)
    def test_roundtrip(self, x, y):
        pass


@given(value=st.nothing())
def test_fuzz(value):
    pass
";

        #[test]
        fn finds_method_by_bare_name() {
            let site = find_function(TESTS, "test_roundtrip").unwrap().unwrap();
            assert_eq!(site.line, 6);
            assert_eq!(site.column, 4);
            assert_eq!(site.decorators.len(), 2);
            assert_eq!(site.given_arguments(), vec!["x", "y"]);
        }

        #[test]
        fn finds_top_level_function() {
            let site = find_function(TESTS, "test_fuzz").unwrap().unwrap();
            assert_eq!(site.line, 12);
            assert_eq!(site.column, 0);
            assert!(site.source.ends_with("pass\n"));
        }

        #[test]
        fn column_counts_a_tab_as_one_character() {
            let source = "class TestTabs:\n\t@given(x=st.integers())\n\tdef test_tab(self, x):\n\t\tpass\n";
            let site = find_function(source, "test_tab").unwrap().unwrap();
            assert_eq!(site.line, 2);
            assert_eq!(site.column, 1);
        }

        #[test]
        fn finds_qualified_method() {
            let site = find_function(TESTS, "TestRoundtrip.test_roundtrip").unwrap();
            assert!(site.is_some());
            assert!(find_function(TESTS, "Other.test_roundtrip").unwrap().is_none());
        }

        #[test]
        fn given_arguments_of_first_given() {
            assert_eq!(given_arguments(TESTS).unwrap(), vec!["x", "y"]);
            assert!(given_arguments("def f():\n    pass\n").unwrap().is_empty());
        }
    }
}
