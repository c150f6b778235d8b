// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Import-structure model for Python modules.
//!
//! An [`ImportStructure`] is the set of top-level imports of a file, keyed
//! by module. It can be parsed from source, merged with another structure,
//! and serialized back to import statements. Merging is what lets a freshly
//! generated test skeleton and an existing test file share one import
//! header without duplicates.
//!
//! ## Serialized form
//!
//! For each module, in first-seen order:
//!
//! ```text
//! import <module>[ as <alias>]                    # if namespace-imported
//! from <module> import <name>[ as <alias>], ...   # if any names
//! ```
//!
//! A star import subsumes every other name of its module and is rendered
//! alone as `from <module> import *`.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Add;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{SourceError, SourceResult};
use crate::outline::Outline;
use crate::syntax;

// ============================================================================
// MaybeAlias
// ============================================================================

/// A name with an optional local alias (`numpy as np`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaybeAlias {
    pub name: String,
    pub alias: Option<String>,
}

impl MaybeAlias {
    /// A name without alias.
    pub fn new(name: impl Into<String>) -> Self {
        MaybeAlias {
            name: name.into(),
            alias: None,
        }
    }

    /// A name bound to a local alias.
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        MaybeAlias {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

impl fmt::Display for MaybeAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

// ============================================================================
// ImportEntry
// ============================================================================

/// Everything imported from one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    /// The module, with the alias of its namespace import if any.
    pub module: MaybeAlias,
    /// Imported names, deduplicated by name in first-seen order.
    names: Vec<MaybeAlias>,
    /// Whether the module itself is imported (`import m`).
    pub import_namespace: bool,
}

impl ImportEntry {
    /// `import <module>`.
    pub fn namespace(module: MaybeAlias) -> Self {
        ImportEntry {
            module,
            names: Vec::new(),
            import_namespace: true,
        }
    }

    /// `from <module> import <names>`.
    pub fn from_names(module: MaybeAlias, names: impl IntoIterator<Item = MaybeAlias>) -> Self {
        let mut entry = ImportEntry {
            module,
            names: Vec::new(),
            import_namespace: false,
        };
        entry.add_names(names);
        entry
    }

    /// The imported names.
    pub fn names(&self) -> &[MaybeAlias] {
        &self.names
    }

    /// Whether the entry imports `name` (directly or through `*`).
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.name == name || n.name == "*")
    }

    /// Whether the entry is a star import.
    pub fn is_saturated(&self) -> bool {
        self.names.iter().any(|n| n.name == "*")
    }

    /// Add one name. A name already present keeps its first alias.
    pub fn add_name(&mut self, name: MaybeAlias) {
        if !self.names.iter().any(|n| n.name == name.name) {
            self.names.push(name);
        }
    }

    /// Add several names.
    pub fn add_names(&mut self, names: impl IntoIterator<Item = MaybeAlias>) {
        for name in names {
            self.add_name(name);
        }
    }

    /// Fold another entry for the same module into this one.
    ///
    /// Names are unioned and the namespace flags are OR-ed. The module alias
    /// seen first wins; an entry without an alias adopts the alias of an
    /// incoming namespace import.
    pub fn merge(&mut self, other: ImportEntry) {
        // A plain `import m` already binds `m`; only a names-only entry may
        // take the alias.
        if !self.import_namespace && self.module.alias.is_none() && other.import_namespace {
            self.module.alias = other.module.alias;
        }
        self.import_namespace |= other.import_namespace;
        self.add_names(other.names);
    }

    /// Render as import statements, one per line, each ending in `\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.import_namespace {
            out.push_str(&format!("import {}\n", self.module));
        }
        if self.is_saturated() {
            out.push_str(&format!("from {} import *\n", self.module.name));
        } else if !self.names.is_empty() {
            let names: Vec<String> = self.names.iter().map(ToString::to_string).collect();
            out.push_str(&format!(
                "from {} import {}\n",
                self.module.name,
                names.join(", ")
            ));
        }
        out
    }
}

impl Add for ImportEntry {
    type Output = ImportEntry;

    fn add(mut self, rhs: ImportEntry) -> ImportEntry {
        self.merge(rhs);
        self
    }
}

// ============================================================================
// ImportStructure
// ============================================================================

/// A fact about an import structure, order and alias independent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportFact {
    /// `import <module>`.
    Namespace(String),
    /// `from <module> import <name>`.
    Name(String, String),
}

/// The imports of one file, keyed by module in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStructure {
    entries: IndexMap<String, ImportEntry>,
}

impl ImportStructure {
    /// An empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, merging with any existing entry for the same module.
    pub fn add_entry(&mut self, entry: ImportEntry) {
        match self.entries.get_mut(&entry.module.name) {
            Some(existing) => existing.merge(entry),
            None => {
                self.entries.insert(entry.module.name.clone(), entry);
            }
        }
    }

    /// Add several entries.
    pub fn add_entries(&mut self, entries: impl IntoIterator<Item = ImportEntry>) {
        for entry in entries {
            self.add_entry(entry);
        }
    }

    /// The entry for a module.
    pub fn get(&self, module: &str) -> Option<&ImportEntry> {
        self.entries.get(module)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` is imported from `module`.
    pub fn contains_name(&self, module: &str, name: &str) -> bool {
        self.entries.get(module).is_some_and(|e| e.has_name(name))
    }

    /// Union of two structures. Modules of `self` come first.
    pub fn union(&self, other: &ImportStructure) -> ImportStructure {
        let mut merged = self.clone();
        merged.add_entries(other.entries.values().cloned());
        merged
    }

    /// Rename a module, merging into an existing entry for `to`.
    pub fn rename_module(&mut self, from: &str, to: &str) {
        if from == to || !self.entries.contains_key(from) {
            return;
        }
        let entries = std::mem::take(&mut self.entries);
        for (_, mut entry) in entries {
            if entry.module.name == from {
                entry.module.name = to.to_string();
            }
            self.add_entry(entry);
        }
    }

    /// The structure's content, ignoring order and aliases.
    pub fn facts(&self) -> BTreeSet<ImportFact> {
        let mut facts = BTreeSet::new();
        for entry in self.entries.values() {
            if entry.import_namespace {
                facts.insert(ImportFact::Namespace(entry.module.name.clone()));
            }
            if entry.is_saturated() {
                facts.insert(ImportFact::Name(entry.module.name.clone(), "*".to_string()));
                continue;
            }
            for name in &entry.names {
                facts.insert(ImportFact::Name(
                    entry.module.name.clone(),
                    name.name.clone(),
                ));
            }
        }
        facts
    }

    /// Serialize to import statements.
    pub fn to_source(&self) -> String {
        self.entries.values().map(ImportEntry::render).collect()
    }
}

impl fmt::Display for ImportStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

impl Add for ImportStructure {
    type Output = ImportStructure;

    fn add(mut self, rhs: ImportStructure) -> ImportStructure {
        self.add_entries(rhs.entries.into_values());
        self
    }
}

impl FromIterator<ImportEntry> for ImportStructure {
    fn from_iter<T: IntoIterator<Item = ImportEntry>>(iter: T) -> Self {
        let mut structure = ImportStructure::new();
        structure.add_entries(iter);
        structure
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Collect the top-level imports of a Python source text.
///
/// Imports nested in functions, classes or compound statements are not part
/// of a file's import header and are ignored. Empty or whitespace-only text
/// yields an empty structure.
pub fn parse_imports(source: &str) -> SourceResult<ImportStructure> {
    let outline = Outline::parse(source)?;
    let mut structure = ImportStructure::new();

    for stmt in outline.statements.iter().filter(|s| s.body.is_empty()) {
        let line = outline.header(stmt);
        for segment in line.segments() {
            if !syntax::is_import(segment) {
                continue;
            }
            let entries = syntax::parse_import_statement(segment)
                .map_err(|message| SourceError::parse(message, line.start_line))?;
            structure.add_entries(entries);
        }
    }

    trace!(modules = structure.len(), "parsed import structure");
    Ok(structure)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod entry {
        use super::*;

        #[test]
        fn add_name_deduplicates_keeping_first_alias() {
            let mut entry = ImportEntry::from_names(MaybeAlias::new("m"), vec![]);
            entry.add_name(MaybeAlias::aliased("a", "x"));
            entry.add_name(MaybeAlias::new("a"));
            entry.add_name(MaybeAlias::new("b"));
            assert_eq!(entry.names().len(), 2);
            assert_eq!(entry.names()[0].alias.as_deref(), Some("x"));
        }

        #[test]
        fn merge_ors_namespace_flag() {
            let names = ImportEntry::from_names(MaybeAlias::new("m"), vec![MaybeAlias::new("f")]);
            let namespace = ImportEntry::namespace(MaybeAlias::new("m"));
            let merged = names + namespace;
            assert!(merged.import_namespace);
            assert_eq!(merged.render(), "import m\nfrom m import f\n");
        }

        #[test]
        fn merge_adopts_alias_of_namespace_import() {
            let names = ImportEntry::from_names(MaybeAlias::new("numpy"), vec![MaybeAlias::new("array")]);
            let namespace = ImportEntry::namespace(MaybeAlias::aliased("numpy", "np"));
            let merged = names + namespace;
            assert_eq!(merged.render(), "import numpy as np\nfrom numpy import array\n");
        }

        #[test]
        fn merge_keeps_plain_namespace_import() {
            let plain = ImportEntry::namespace(MaybeAlias::new("numpy"));
            let aliased = ImportEntry::namespace(MaybeAlias::aliased("numpy", "np"));
            let merged = plain + aliased;
            assert_eq!(merged.module.alias, None);
            assert_eq!(merged.render(), "import numpy\n");
        }

        #[test]
        fn merge_keeps_first_alias() {
            let first = ImportEntry::namespace(MaybeAlias::aliased("numpy", "np"));
            let second = ImportEntry::namespace(MaybeAlias::aliased("numpy", "numpy_"));
            assert_eq!((first + second).module.alias.as_deref(), Some("np"));
        }

        #[test]
        fn star_import_has_every_name() {
            let entry = ImportEntry::from_names(MaybeAlias::new("m"), vec![MaybeAlias::new("*")]);
            assert!(entry.is_saturated());
            assert!(entry.has_name("anything"));
        }

        #[test]
        fn saturated_entry_renders_only_the_star() {
            let entry = ImportEntry::from_names(MaybeAlias::new("m"), vec![MaybeAlias::new("a")])
                + ImportEntry::from_names(MaybeAlias::new("m"), vec![MaybeAlias::new("*")])
                + ImportEntry::from_names(MaybeAlias::new("m"), vec![MaybeAlias::new("b")]);
            assert_eq!(entry.render(), "from m import *\n");
        }
    }

    mod structure {
        use super::*;

        #[test]
        fn parse_and_serialize() {
            let src = "import unittest\nfrom hypothesis import given, strategies as st\nimport m\n";
            let structure = parse_imports(src).unwrap();
            assert_eq!(structure.to_source(), src);
        }

        #[test]
        fn repeated_modules_merge() {
            let src = "from hypothesis import given\nimport os\nfrom hypothesis import example, given\n";
            let structure = parse_imports(src).unwrap();
            assert_eq!(
                structure.to_source(),
                "from hypothesis import given, example\nimport os\n"
            );
        }

        #[test]
        fn nested_imports_are_ignored() {
            let src = "import os\n\ndef f():\n    import sys\n    return sys\n\nif True: import json\n";
            let structure = parse_imports(src).unwrap();
            assert_eq!(structure.len(), 1);
            assert!(structure.get("os").is_some());
        }

        #[test]
        fn semicolon_separated_imports() {
            let structure = parse_imports("import os; x = 1; from a import b\n").unwrap();
            assert_eq!(structure.to_source(), "import os\nfrom a import b\n");
        }

        #[test]
        fn multi_line_from_import() {
            let src = "from hypothesis import (\n    given,  # decorator\n    strategies as st,\n)\n";
            let structure = parse_imports(src).unwrap();
            assert_eq!(
                structure.to_source(),
                "from hypothesis import given, strategies as st\n"
            );
        }

        #[test]
        fn empty_text_gives_empty_structure() {
            assert!(parse_imports("").unwrap().is_empty());
            assert!(parse_imports("  \n\t\n").unwrap().is_empty());
            assert_eq!(ImportStructure::new().to_source(), "");
        }

        #[test]
        fn malformed_import_is_a_parse_failure() {
            let err = parse_imports("x = 1\nfrom m import\n").unwrap_err();
            assert_eq!(err.line(), Some(2));
        }

        #[test]
        fn union_keeps_left_order_first() {
            let left = parse_imports("import a\nimport b\n").unwrap();
            let right = parse_imports("import c\nfrom a import f\n").unwrap();
            assert_eq!(
                left.union(&right).to_source(),
                "import a\nfrom a import f\nimport b\nimport c\n"
            );
        }

        #[test]
        fn contains_name() {
            let structure = parse_imports("from hypothesis import given\n").unwrap();
            assert!(structure.contains_name("hypothesis", "given"));
            assert!(!structure.contains_name("hypothesis", "example"));
            assert!(!structure.contains_name("unittest", "TestCase"));
        }

        #[test]
        fn rename_module_merges_into_existing() {
            let mut structure =
                parse_imports("import auxiliary\nimport m\nfrom auxiliary import f\n").unwrap();
            structure.rename_module("auxiliary", "m");
            assert_eq!(structure.to_source(), "import m\nfrom m import f\n");
        }

        #[test]
        fn relative_imports_serialize_with_dots() {
            let structure = parse_imports("from . import sibling\nfrom ..pkg import x\n").unwrap();
            assert_eq!(
                structure.to_source(),
                "from . import sibling\nfrom ..pkg import x\n"
            );
        }
    }
}
