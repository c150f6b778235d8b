//! Logical-line scanner for Python source.
//!
//! Splits source text into *logical lines* the way the Python tokenizer
//! does: a newline inside brackets or a string, or after a backslash, does
//! not end the line. Each logical line keeps its raw byte span (for
//! byte-exact rewriting) and a normalized `code` form with comments removed
//! and continuations folded into spaces (for classification and parsing).
//!
//! The scanner is deliberately small. It understands string literals,
//! comments, bracket nesting, continuation and top-level `;` separators,
//! which is everything the import and signature layers need.

use crate::error::{SourceError, SourceResult};

/// One logical line of Python source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine<'a> {
    /// Raw source text, from the first indentation byte to the end of the
    /// last physical line (newline excluded).
    pub raw: &'a str,
    /// Code without comments, indentation, or line continuations.
    pub code: String,
    /// Indentation width (tabs advance to the next multiple of 8).
    pub indent: usize,
    /// First physical line (1-indexed).
    pub start_line: u32,
    /// Last physical line (1-indexed).
    pub end_line: u32,
    /// Byte offset of the start of the first physical line.
    pub start: usize,
    /// Byte offset just past the terminating newline (or end of input).
    pub span_end: usize,
    /// Byte offsets into `code` of top-level `;` separators.
    pub separators: Vec<usize>,
}

impl LogicalLine<'_> {
    /// True when the line holds nothing but whitespace and comments.
    pub fn is_blank(&self) -> bool {
        self.code.trim().is_empty()
    }

    /// The simple statements of this line, split at top-level `;`.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = Vec::with_capacity(self.separators.len() + 1);
        let mut begin = 0;
        for &sep in &self.separators {
            segments.push(self.code[begin..sep].trim());
            begin = sep + 1;
        }
        segments.push(self.code[begin..].trim());
        segments.retain(|s| !s.is_empty());
        segments
    }

    /// True when the line opens an indented block (`def f():`, `class A:`).
    pub fn opens_block(&self) -> bool {
        self.separators.is_empty() && self.code.trim_end().ends_with(':')
    }
}

/// Split Python source into logical lines.
///
/// Blank and comment-only lines are returned too (with empty `code`) so
/// that callers can rebuild the source byte for byte.
pub fn logical_lines(source: &str) -> SourceResult<Vec<LogicalLine<'_>>> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut lines = Vec::new();
    let mut i = 0;
    let mut line_no = 1u32;

    while i < len {
        let start = i;
        let start_line = line_no;

        let mut indent = 0usize;
        while i < len {
            match bytes[i] {
                b' ' => indent += 1,
                b'\t' => indent = (indent / 8 + 1) * 8,
                b'\x0c' => indent = 0,
                _ => break,
            }
            i += 1;
        }

        let mut code = String::new();
        let mut separators = Vec::new();
        let mut brackets: Vec<(u8, u32)> = Vec::new();
        let mut copy_from = i;
        let mut end = len;
        let mut terminated = false;

        while i < len {
            match bytes[i] {
                b'#' => {
                    code.push_str(&source[copy_from..i]);
                    while i < len && bytes[i] != b'\n' {
                        i += 1;
                    }
                    copy_from = i;
                }
                b'\'' | b'"' => {
                    i = skip_string(bytes, i, &mut line_no)?;
                }
                open @ (b'(' | b'[' | b'{') => {
                    brackets.push((open, line_no));
                    i += 1;
                }
                close @ (b')' | b']' | b'}') => {
                    match brackets.pop() {
                        Some((open, _)) if closing_for(open) == close => {}
                        Some((open, line)) => {
                            return Err(SourceError::parse(
                                format!(
                                    "closing parenthesis '{}' does not match opening parenthesis '{}' on line {}",
                                    close as char, open as char, line
                                ),
                                line_no,
                            ));
                        }
                        None => {
                            return Err(SourceError::parse(
                                format!("unmatched '{}'", close as char),
                                line_no,
                            ));
                        }
                    }
                    i += 1;
                }
                b';' if brackets.is_empty() => {
                    code.push_str(&source[copy_from..i]);
                    separators.push(code.len());
                    code.push(';');
                    i += 1;
                    copy_from = i;
                }
                b'\\' => {
                    let newline_len = newline_at(bytes, i + 1);
                    if newline_len > 0 {
                        code.push_str(&source[copy_from..i]);
                        code.push(' ');
                        i += 1 + newline_len;
                        line_no += 1;
                        copy_from = i;
                    } else {
                        i += 1;
                    }
                }
                b'\n' => {
                    code.push_str(&source[copy_from..i]);
                    if brackets.is_empty() {
                        end = i;
                        i += 1;
                        terminated = true;
                        break;
                    }
                    code.push(' ');
                    i += 1;
                    line_no += 1;
                    copy_from = i;
                }
                _ => i += 1,
            }
        }

        if !terminated {
            if let Some(&(open, line)) = brackets.last() {
                return Err(SourceError::parse(
                    format!("'{}' was never closed", open as char),
                    line,
                ));
            }
            code.push_str(&source[copy_from..len]);
            end = len;
        }

        let raw = source[start..end].trim_end_matches('\r');
        let trimmed_len = code.trim_end().len();
        code.truncate(trimmed_len);
        separators.retain(|&s| s < code.len());

        lines.push(LogicalLine {
            raw,
            code,
            indent,
            start_line,
            end_line: line_no,
            start,
            span_end: i,
            separators,
        });

        if terminated {
            line_no += 1;
        }
    }

    Ok(lines)
}

/// Split `text` at top-level occurrences of `sep`, ignoring separators that
/// sit inside brackets or string literals. Pieces are trimmed.
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ if b == sep && depth == 0 => {
                    pieces.push(text[begin..i].trim());
                    begin = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    pieces.push(text[begin..].trim());
    pieces
}

/// Byte index of the bracket closing the one opened just before `text`.
///
/// `text` starts right after an opening bracket; returns the offset of the
/// matching closing bracket, if any.
pub fn find_closing(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn closing_for(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

/// Length of the newline sequence at `i` (0 if none).
fn newline_at(bytes: &[u8], i: usize) -> usize {
    match bytes.get(i) {
        Some(b'\n') => 1,
        Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => 2,
        _ => 0,
    }
}

/// Skip a string literal starting at the quote byte `i`.
///
/// Returns the offset just past the closing quote.
fn skip_string(bytes: &[u8], i: usize, line_no: &mut u32) -> SourceResult<usize> {
    let quote = bytes[i];
    let start_line = *line_no;
    let triple = bytes.len() >= i + 3 && bytes[i + 1] == quote && bytes[i + 2] == quote;
    let mut j = if triple { i + 3 } else { i + 1 };

    while j < bytes.len() {
        match bytes[j] {
            b'\\' => {
                if bytes.get(j + 1) == Some(&b'\n') {
                    *line_no += 1;
                }
                j += 2;
            }
            b'\n' => {
                if !triple {
                    return Err(SourceError::parse(
                        "unterminated string literal",
                        start_line,
                    ));
                }
                *line_no += 1;
                j += 1;
            }
            b if b == quote => {
                if !triple {
                    return Ok(j + 1);
                }
                if bytes.len() >= j + 3 && bytes[j + 1] == quote && bytes[j + 2] == quote {
                    return Ok(j + 3);
                }
                j += 1;
            }
            _ => j += 1,
        }
    }

    let message = if triple {
        "unterminated triple-quoted string literal"
    } else {
        "unterminated string literal"
    };
    Err(SourceError::parse(message, start_line))
}
