// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Source rewriting: strip a file's import header and rebuild it from an
//! [`ImportStructure`].
//!
//! Stripping works on byte spans from the scanner, so everything that is
//! not a top-level import survives verbatim: comments, blank lines, string
//! contents and the formatting of the remaining code.

use tracing::debug;

use crate::error::SourceResult;
use crate::imports::ImportStructure;
use crate::outline::Outline;
use crate::syntax;

/// Attribution header placed between imports and body of generated tests.
pub const GHOSTWRITER_BANNER: &str = "# This test code was written by the `hypothesis.extra.ghostwriter` module\n\
# and is provided under the Creative Commons Zero public domain dedication\n";

/// Rebuilds test files around a merged import header.
#[derive(Debug, Clone)]
pub struct Rewriter {
    banner: String,
}

impl Default for Rewriter {
    fn default() -> Self {
        Rewriter {
            banner: GHOSTWRITER_BANNER.to_string(),
        }
    }
}

impl Rewriter {
    /// A rewriter emitting a custom banner. The banner should end in `\n`.
    pub fn with_banner(banner: impl Into<String>) -> Self {
        Rewriter {
            banner: banner.into(),
        }
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Remove every top-level import statement and a leading banner.
    ///
    /// Lines mixing imports with other statements (`import os; x = 1`) keep
    /// their non-import statements.
    pub fn strip_imports(&self, source: &str) -> SourceResult<String> {
        let outline = Outline::parse(source)?;
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        let mut removed = 0usize;

        for stmt in outline.statements.iter().filter(|s| s.body.is_empty()) {
            let line = outline.header(stmt);
            let segments = line.segments();
            if !segments.iter().any(|s| syntax::is_import(s)) {
                continue;
            }

            out.push_str(&source[cursor..line.start]);
            let kept: Vec<&str> = segments
                .into_iter()
                .filter(|s| !syntax::is_import(s))
                .collect();
            if !kept.is_empty() {
                out.push_str(&kept.join("; "));
                out.push('\n');
            }
            cursor = line.span_end;
            removed += 1;
        }
        out.push_str(&source[cursor..]);

        debug!(removed, "stripped import statements");
        Ok(self.strip_banner(&out).to_string())
    }

    /// Rebuild `source` with `structure` as its import header.
    ///
    /// The result is the serialized imports, a blank line, the banner, two
    /// blank lines and the stripped body. Rewriting is idempotent for a
    /// fixed structure.
    pub fn rewrite(&self, source: &str, structure: &ImportStructure) -> SourceResult<String> {
        let body = self.strip_imports(source)?;
        let body = body.trim_end();

        let mut out = structure.to_source();
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.banner);
        if !body.is_empty() {
            out.push_str("\n\n");
            out.push_str(body);
            out.push('\n');
        }
        Ok(out)
    }

    /// Drop leading blank lines and one copy of the banner.
    ///
    /// The generator's own banner ends its second line with a period; both
    /// spellings are recognized.
    fn strip_banner<'s>(&self, text: &'s str) -> &'s str {
        let text = trim_leading_blank_lines(text);
        let dotted = self
            .banner
            .strip_suffix('\n')
            .map(|b| format!("{}.\n", b))
            .unwrap_or_default();

        let rest = text
            .strip_prefix(self.banner.as_str())
            .or_else(|| text.strip_prefix(dotted.as_str()).filter(|_| !dotted.is_empty()));
        match rest {
            Some(rest) => trim_leading_blank_lines(rest),
            None => text,
        }
    }
}

/// Strip every import, see [`Rewriter::strip_imports`].
pub fn strip_imports(source: &str) -> SourceResult<String> {
    Rewriter::default().strip_imports(source)
}

/// Rewrite with the default banner, see [`Rewriter::rewrite`].
pub fn rewrite(source: &str, structure: &ImportStructure) -> SourceResult<String> {
    Rewriter::default().rewrite(source, structure)
}

fn trim_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    loop {
        match rest.find('\n') {
            Some(end) if rest[..end].trim().is_empty() => rest = &rest[end + 1..],
            _ => return rest,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
