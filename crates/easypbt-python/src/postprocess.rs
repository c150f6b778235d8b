//! Post-processing of baseline generator output.
//!
//! The generator's binary-operation mode writes module-level test functions
//! against a placeholder module and includes an identity test that does not
//! belong to the "different paths, same destination" pattern. This module
//! turns that output into a `unittest` class against the real module.

use tracing::debug;

use crate::error::SourceResult;
use crate::imports::{parse_imports, ImportEntry, ImportStructure, MaybeAlias};
use crate::outline::{Outline, StatementKind};
use crate::pattern::PatternKind;
use crate::rewrite::strip_imports;
use crate::synth::test_class_name;

/// Rewrite binary-operation output into a test class for `function`.
///
/// - imports are collected, `placeholder` is renamed to `module`, and
///   `import unittest` is added in front
/// - the `test_identity_binary_operation_<function>` test is removed
/// - every remaining module-level test gains a leading `self` parameter
/// - `placeholder.` references in the body are redirected to `module.`
/// - the body is indented into `class Test...(unittest.TestCase)`
pub fn wrap_binary_operation(
    generated: &str,
    module: &str,
    function: &str,
    placeholder: &str,
) -> SourceResult<String> {
    let mut found = parse_imports(generated)?;
    found.rename_module(placeholder, module);
    let imports: ImportStructure =
        std::iter::once(ImportEntry::namespace(MaybeAlias::new("unittest"))).collect();
    let imports = imports.union(&found);

    let short_name = function.rsplit('.').next().unwrap_or(function);
    let body = strip_imports(generated)?;
    let body = remove_function(&body, &format!("test_identity_binary_operation_{}", short_name))?;
    let body = add_self_parameters(&body)?;
    let body = redirect_module(&body, placeholder, module);

    let mut out = imports.to_source();
    out.push_str("\n\n");
    out.push_str(&format!(
        "class {}(unittest.TestCase):\n",
        test_class_name(PatternKind::DiffPathSameDest, function)
    ));
    for line in body.trim_end().lines() {
        out.push('\n');
        if !line.trim().is_empty() {
            out.push_str("    ");
            out.push_str(line);
        }
    }
    out.push('\n');

    debug!(module, function, "wrapped binary operation tests");
    Ok(out)
}

/// Remove a module-level function (decorators included).
fn remove_function(source: &str, name: &str) -> SourceResult<String> {
    let outline = Outline::parse(source)?;
    let target = outline
        .statements
        .iter()
        .find(|s| matches!(&s.kind, StatementKind::Def { name: n } if n == name));

    Ok(match target {
        Some(stmt) => {
            let span = outline.span(stmt);
            format!("{}{}", &source[..span.start], &source[span.end..])
        }
        None => source.to_string(),
    })
}

/// Insert `self` as first parameter of every module-level function.
fn add_self_parameters(source: &str) -> SourceResult<String> {
    let outline = Outline::parse(source)?;
    let mut inserts = Vec::new();

    for stmt in &outline.statements {
        if !matches!(stmt.kind, StatementKind::Def { .. }) {
            continue;
        }
        let header = outline.header(stmt);
        if let Some(open) = header.raw.find('(') {
            let after = &header.raw[open + 1..];
            let text = if after.trim_start().starts_with(')') {
                "self"
            } else {
                "self, "
            };
            inserts.push((header.start + open + 1, text));
        }
    }

    let mut out = source.to_string();
    for (at, text) in inserts.into_iter().rev() {
        out.insert_str(at, text);
    }
    Ok(out)
}

/// Replace `placeholder.` with `module.` where `placeholder` is a whole
/// identifier.
fn redirect_module(source: &str, placeholder: &str, module: &str) -> String {
    let needle = format!("{}.", placeholder);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for (at, _) in source.match_indices(&needle) {
        let preceded_by_ident = source[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if preceded_by_ident {
            continue;
        }
        out.push_str(&source[cursor..at]);
        out.push_str(module);
        out.push('.');
        cursor = at + needle.len();
    }
    out.push_str(&source[cursor..]);
    out
}
