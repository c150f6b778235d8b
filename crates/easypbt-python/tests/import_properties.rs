// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Property tests for the import-structure algebra and the rewriter.
//!
//! 1. Union is idempotent
//! 2. Union is commutative on content
//! 3. Serialization round-trips
//! 4. Merging an already-present name changes nothing
//! 5. A star import subsumes the names of its module
//! 6. A plain namespace import is never replaced by a later alias
//! 7. Rewriting preserves non-import code

use easypbt_python::imports::{parse_imports, ImportStructure};
use easypbt_python::rewrite::{rewrite, strip_imports};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn module_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("os".to_string()),
        Just("m".to_string()),
        Just("numpy".to_string()),
        Just("pkg.sub".to_string()),
        Just("hypothesis".to_string()),
        Just(".".to_string()),
    ]
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("b".to_string()),
        Just("given".to_string()),
        Just("strategies".to_string()),
        Just("x".to_string()),
    ]
}

fn alias_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        3 => Just(None),
        1 => Just(Some("np".to_string())),
        1 => Just(Some("alias_".to_string())),
    ]
}

fn with_alias(name: &str, alias: &Option<String>) -> String {
    match alias {
        Some(alias) => format!("{} as {}", name, alias),
        None => name.to_string(),
    }
}

/// One import statement.
fn import_statement_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (module_strategy(), alias_strategy())
            .prop_filter("relative modules need `from`", |(m, _)| m != ".")
            .prop_map(|(m, alias)| format!("import {}", with_alias(&m, &alias))),
        (
            module_strategy(),
            prop::collection::vec((name_strategy(), alias_strategy()), 1..4)
        )
            .prop_map(|(m, names)| {
                let names: Vec<String> = names.iter().map(|(n, a)| with_alias(n, a)).collect();
                format!("from {} import {}", m, names.join(", "))
            }),
    ]
}

fn imports_source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(import_statement_strategy(), 0..6)
        .prop_map(|lines| lines.iter().map(|l| format!("{}\n", l)).collect())
}

fn structure_strategy() -> impl Strategy<Value = ImportStructure> {
    imports_source_strategy().prop_map(|src| parse_imports(&src).unwrap())
}

#[derive(Debug, Clone)]
enum Line {
    Import(String),
    Code(&'static str),
}

fn code_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("x = 1"),
        Just("print(x)  # show"),
        Just("def f(a):\n    import sys\n    return a"),
        Just("# a comment"),
        Just("s = 'import os'"),
        Just(""),
        Just("class C:\n    value = (1,\n             2)"),
    ]
}

fn module_source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            import_statement_strategy().prop_map(Line::Import),
            code_strategy().prop_map(Line::Code),
        ],
        0..10,
    )
    .prop_map(|lines| {
        lines
            .into_iter()
            .map(|line| match line {
                Line::Import(text) => format!("{}\n", text),
                Line::Code(text) => format!("{}\n", text),
            })
            .collect()
    })
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn union_is_idempotent(s in structure_strategy()) {
        let merged = s.union(&s);
        prop_assert_eq!(merged.to_source(), s.to_source());
        prop_assert_eq!(merged.facts(), s.facts());
    }

    #[test]
    fn union_is_commutative_on_content(a in structure_strategy(), b in structure_strategy()) {
        prop_assert_eq!(a.union(&b).facts(), b.union(&a).facts());
    }

    #[test]
    fn union_contains_both_sides(a in structure_strategy(), b in structure_strategy()) {
        let facts = a.union(&b).facts();
        prop_assert!(a.facts().is_subset(&facts));
        prop_assert!(b.facts().is_subset(&facts));
    }

    #[test]
    fn serialization_round_trips(s in structure_strategy()) {
        let source = s.to_source();
        let reparsed = parse_imports(&source).unwrap();
        prop_assert_eq!(reparsed.facts(), s.facts());
        prop_assert_eq!(reparsed.to_source(), source);
    }

    #[test]
    fn merging_a_present_name_changes_nothing(s in structure_strategy()) {
        for entry in s.entries() {
            for name in entry.names() {
                let single = parse_imports(&format!(
                    "from {} import {}\n",
                    entry.module.name, name.name
                ))
                .unwrap();
                let merged = s.union(&single);
                prop_assert_eq!(merged.facts(), s.facts());
                prop_assert_eq!(merged.to_source(), s.to_source());
            }
        }
    }

    #[test]
    fn star_import_subsumes_names(s in structure_strategy(), module in module_strategy()) {
        let star = parse_imports(&format!("from {} import *\n", module)).unwrap();
        let merged = s.union(&star);
        let entry = merged.get(&module).unwrap();
        prop_assert!(entry.is_saturated());
        let merged_source = merged.to_source();
        let from_lines: Vec<&str> = merged_source
            .lines()
            .filter(|l| l.starts_with(&format!("from {} import", module)))
            .collect();
        prop_assert_eq!(from_lines, vec![format!("from {} import *", module)]);
    }

    #[test]
    fn plain_namespace_import_survives_aliased_union(
        s in structure_strategy(),
        module in module_strategy(),
    ) {
        let plain = parse_imports(&format!("import {}\n", module)).unwrap();
        let aliased = parse_imports(&format!("import {} as np\n", module)).unwrap();
        let merged = plain.union(&s).union(&aliased);
        let plain_line = format!("import {}", module);
        prop_assert!(merged.to_source().lines().any(|l| l == plain_line));
        prop_assert_eq!(merged.get(&module).unwrap().module.alias.as_deref(), None);
    }

    #[test]
    fn rewrite_preserves_non_import_code(
        src in module_source_strategy(),
        target in structure_strategy(),
    ) {
        let rewritten = rewrite(&src, &target).unwrap();
        let stripped_rewritten = strip_imports(&rewritten).unwrap();
        let stripped_src = strip_imports(&src).unwrap();
        prop_assert_eq!(
            stripped_rewritten.trim_end(),
            stripped_src.trim_end()
        );
        prop_assert_eq!(parse_imports(&rewritten).unwrap().facts(), target.facts());
    }

    #[test]
    fn rewrite_is_idempotent(src in module_source_strategy(), target in structure_strategy()) {
        let once = rewrite(&src, &target).unwrap();
        let twice = rewrite(&once, &target).unwrap();
        prop_assert_eq!(once, twice);
    }
}
