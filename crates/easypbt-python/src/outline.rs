//! Indentation-based statement outline.
//!
//! Groups logical lines into statements and nests block bodies under their
//! headers, validating indentation the way the Python compiler does. Only
//! the information the import and function layers need is kept: what kind
//! of statement it is, which lines it covers, and its nested body.

use std::ops::Range;

use crate::error::{SourceError, SourceResult};
use crate::lexer::{logical_lines, LogicalLine};
use crate::syntax::{self, Leading};

/// What a statement is, as far as we care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// A simple statement whose first segment is an import.
    Import,
    /// A function definition (`def` or `async def`).
    Def { name: String },
    /// A class definition.
    Class { name: String },
    /// Anything else.
    Other,
}

/// A statement and, for block headers, its nested body.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    /// Index of the first line (the first decorator, if any).
    pub first: usize,
    /// Index of the header line (`def`/`class` line for decorated blocks).
    pub header: usize,
    /// Index of the last non-blank line of the statement.
    pub last: usize,
    /// Indentation of the header.
    pub indent: usize,
    /// Nested statements of a block body.
    pub body: Vec<Statement>,
}

/// Parsed outline of a source text.
#[derive(Debug, Clone)]
pub struct Outline<'a> {
    pub lines: Vec<LogicalLine<'a>>,
    pub statements: Vec<Statement>,
}

impl<'a> Outline<'a> {
    /// Scan and outline `source`.
    pub fn parse(source: &'a str) -> SourceResult<Self> {
        let lines = logical_lines(source)?;
        let code_lines: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_blank())
            .map(|(i, _)| i)
            .collect();

        let mut pos = 0;
        let statements = parse_block(&lines, &code_lines, &mut pos, 0)?;
        if let Some(&idx) = code_lines.get(pos) {
            return Err(SourceError::parse(
                "unindent does not match any outer indentation level",
                lines[idx].start_line,
            ));
        }

        Ok(Outline { lines, statements })
    }

    /// The header line of a statement.
    pub fn header(&self, stmt: &Statement) -> &LogicalLine<'a> {
        &self.lines[stmt.header]
    }

    /// Byte range covering the whole statement, decorators and trailing
    /// newline included.
    pub fn span(&self, stmt: &Statement) -> Range<usize> {
        self.lines[stmt.first].start..self.lines[stmt.last].span_end
    }

    /// 1-indexed line of the header.
    pub fn start_line(&self, stmt: &Statement) -> u32 {
        self.lines[stmt.header].start_line
    }

    /// 1-indexed last line of the statement.
    pub fn end_line(&self, stmt: &Statement) -> u32 {
        self.lines[stmt.last].end_line
    }

    /// Decorator lines preceding a header, in order.
    pub fn decorators(&self, stmt: &Statement) -> impl Iterator<Item = &LogicalLine<'a>> {
        self.lines[stmt.first..stmt.header]
            .iter()
            .filter(|line| !line.is_blank())
    }
}

fn parse_block(
    lines: &[LogicalLine<'_>],
    code_lines: &[usize],
    pos: &mut usize,
    indent: usize,
) -> SourceResult<Vec<Statement>> {
    let mut statements = Vec::new();

    while let Some(&first) = code_lines.get(*pos) {
        let line = &lines[first];
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(SourceError::parse("unexpected indent", line.start_line));
        }

        // Decorators attach to the following def or class.
        let mut header = first;
        while syntax::leading(&lines[header].code) == Leading::Decorator {
            *pos += 1;
            match code_lines.get(*pos) {
                Some(&next) if lines[next].indent == indent => header = next,
                _ => {
                    return Err(SourceError::parse(
                        "decorator is not followed by a definition",
                        lines[header].start_line,
                    ))
                }
            }
        }
        let header_line = &lines[header];
        let kind = classify(header_line)?;
        if header != first && !matches!(kind, StatementKind::Def { .. } | StatementKind::Class { .. })
        {
            return Err(SourceError::parse(
                "decorator is not followed by a definition",
                lines[first].start_line,
            ));
        }
        *pos += 1;

        let mut last = header;
        let mut body = Vec::new();
        if header_line.opens_block() {
            let child_indent = match code_lines.get(*pos) {
                Some(&next) if lines[next].indent > indent => lines[next].indent,
                _ => {
                    return Err(SourceError::parse(
                        "expected an indented block",
                        header_line.end_line,
                    ))
                }
            };
            body = parse_block(lines, code_lines, pos, child_indent)?;
            last = code_lines[*pos - 1];

            if let Some(&next) = code_lines.get(*pos) {
                if lines[next].indent > indent {
                    return Err(SourceError::parse(
                        "unindent does not match any outer indentation level",
                        lines[next].start_line,
                    ));
                }
            }
        }

        statements.push(Statement {
            kind,
            first,
            header,
            last,
            indent,
            body,
        });
    }

    Ok(statements)
}

fn classify(line: &LogicalLine<'_>) -> SourceResult<StatementKind> {
    let kind = match syntax::leading(&line.code) {
        Leading::Import | Leading::From => StatementKind::Import,
        Leading::Def | Leading::AsyncDef => {
            let header = syntax::parse_def_header(&line.code)
                .map_err(|message| SourceError::parse(message, line.start_line))?;
            StatementKind::Def { name: header.name }
        }
        Leading::Class => {
            let name = syntax::parse_class_name(&line.code)
                .map_err(|message| SourceError::parse(message, line.start_line))?;
            StatementKind::Class { name }
        }
        Leading::Decorator | Leading::Other => StatementKind::Other,
    };
    Ok(kind)
}
