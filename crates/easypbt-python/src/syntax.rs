//! Statement-level grammar for the few Python constructs we read.
//!
//! The lexer hands us one simple statement (or block header) at a time,
//! already stripped of comments and continuations. The parsers here cover:
//!
//! ```text
//! <import>      := "import" <dotted_as> ("," <dotted_as>)*
//! <from>        := "from" <relative> "import" ("*" | "(" <names> [","] ")" | <names>)
//! <relative>    := "."* [<dotted>]
//! <dotted_as>   := <dotted> ["as" NAME]
//! <names>       := NAME ["as" NAME] ("," NAME ["as" NAME])*
//! <def_header>  := ["async"] "def" NAME "(" <params> ")" ...
//! <class_header>:= "class" NAME ...
//! ```

use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::take_while;
use winnow::ModalResult;

use crate::imports::{ImportEntry, MaybeAlias};
use crate::lexer::{find_closing, split_top_level};

// ============================================================================
// Statement classification
// ============================================================================

/// The leading keyword of a statement, if it is one we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leading {
    Import,
    From,
    Def,
    AsyncDef,
    Class,
    Decorator,
    Other,
}

/// Classify a statement by its first word.
pub fn leading(code: &str) -> Leading {
    let code = code.trim_start();
    if code.starts_with('@') {
        return Leading::Decorator;
    }
    let mut words = code.split(|c: char| !(c.is_alphanumeric() || c == '_'));
    match words.next() {
        Some("import") => Leading::Import,
        Some("from") => Leading::From,
        Some("def") => Leading::Def,
        Some("class") => Leading::Class,
        Some("async") if code["async".len()..].trim_start().starts_with("def") => {
            Leading::AsyncDef
        }
        _ => Leading::Other,
    }
}

/// True when a simple statement is an import of either form.
pub fn is_import(code: &str) -> bool {
    matches!(leading(code), Leading::Import | Leading::From)
}

// ============================================================================
// Imports
// ============================================================================

/// Parse one import statement into entries.
///
/// `import a, b as c` yields one namespace entry per module; the `from`
/// form yields a single entry.
pub fn parse_import_statement(code: &str) -> Result<Vec<ImportEntry>, String> {
    let code = code.trim();
    alt((parse_plain_import, parse_from_import.map(|entry| vec![entry])))
        .parse(code)
        .map_err(|_| format!("malformed import statement `{}`", code))
}

fn parse_plain_import(input: &mut &str) -> ModalResult<Vec<ImportEntry>> {
    keyword(input, "import")?;
    let _ = multispace0.parse_next(input)?;
    let first = parse_dotted_as(input)?;
    let rest: Vec<MaybeAlias> = repeat(
        0..,
        preceded((multispace0, ',', multispace0), parse_dotted_as),
    )
    .parse_next(input)?;
    let _ = multispace0.parse_next(input)?;

    let mut modules = vec![first];
    modules.extend(rest);
    Ok(modules.into_iter().map(ImportEntry::namespace).collect())
}

fn parse_from_import(input: &mut &str) -> ModalResult<ImportEntry> {
    keyword(input, "from")?;
    let _ = multispace0.parse_next(input)?;
    let module = parse_relative_module(input)?;
    let _ = multispace0.parse_next(input)?;
    keyword(input, "import")?;
    let _ = multispace0.parse_next(input)?;

    let names = alt((
        '*'.map(|_| vec![MaybeAlias::new("*")]),
        delimited(
            ('(', multispace0),
            parse_import_names,
            (multispace0, opt(','), multispace0, ')'),
        ),
        parse_import_names,
    ))
    .parse_next(input)?;
    let _ = multispace0.parse_next(input)?;

    Ok(ImportEntry::from_names(MaybeAlias::new(module), names))
}

fn parse_import_names(input: &mut &str) -> ModalResult<Vec<MaybeAlias>> {
    let first = parse_name_as(input)?;
    let rest: Vec<MaybeAlias> =
        repeat(0.., preceded((multispace0, ',', multispace0), parse_name_as)).parse_next(input)?;
    let mut names = vec![first];
    names.extend(rest);
    Ok(names)
}

fn parse_name_as(input: &mut &str) -> ModalResult<MaybeAlias> {
    let name = identifier(input)?;
    let alias = opt(parse_alias).parse_next(input)?;
    Ok(MaybeAlias {
        name: name.to_string(),
        alias,
    })
}

fn parse_dotted_as(input: &mut &str) -> ModalResult<MaybeAlias> {
    let name = parse_dotted(input)?;
    let alias = opt(parse_alias).parse_next(input)?;
    Ok(MaybeAlias { name, alias })
}

fn parse_alias(input: &mut &str) -> ModalResult<String> {
    let _ = multispace0.parse_next(input)?;
    keyword(input, "as")?;
    let _ = multispace0.parse_next(input)?;
    identifier(input).map(str::to_string)
}

fn parse_dotted(input: &mut &str) -> ModalResult<String> {
    let first = identifier(input)?;
    let rest: Vec<&str> =
        repeat(0.., preceded((multispace0, '.', multispace0), identifier)).parse_next(input)?;
    let mut dotted = first.to_string();
    for part in rest {
        dotted.push('.');
        dotted.push_str(part);
    }
    Ok(dotted)
}

/// `from` targets keep their leading dots: `..pkg.mod`, `.`, `pkg`.
fn parse_relative_module(input: &mut &str) -> ModalResult<String> {
    let dots: &str = take_while(0.., '.').parse_next(input)?;
    let module = if dots.is_empty() {
        Some(parse_dotted(input)?)
    } else {
        // `from . import x`: the word after the dots is the keyword
        let checkpoint = *input;
        match opt(preceded(multispace0, parse_dotted)).parse_next(input)? {
            Some(name) if name == "import" => {
                *input = checkpoint;
                None
            }
            other => other,
        }
    };
    Ok(format!("{}{}", dots, module.unwrap_or_default()))
}

// ============================================================================
// Definitions
// ============================================================================

/// How a parameter can be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

/// A parameter in a `def` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

/// A parsed `def` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefHeader {
    pub name: String,
    pub is_async: bool,
    pub params: Vec<Parameter>,
}

impl DefHeader {
    /// Names that can be passed as keyword arguments in declaration order,
    /// excluding a leading `self`.
    pub fn keyword_parameters(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .params
            .iter()
            .filter(|p| p.kind == ParameterKind::PositionalOrKeyword)
            .map(|p| p.name.clone())
            .collect();
        let leading_self = self
            .params
            .first()
            .is_some_and(|p| p.name == "self" && p.kind == ParameterKind::PositionalOrKeyword);
        if leading_self {
            names.remove(0);
        }
        names
    }
}

/// Parse a `def` header from a logical line's code.
pub fn parse_def_header(code: &str) -> Result<DefHeader, String> {
    let mut rest = code.trim_start();
    let (is_async, name) = parse_def_prefix
        .parse_next(&mut rest)
        .map_err(|_| format!("malformed function definition `{}`", code.trim()))?;
    let close = find_closing(rest)
        .ok_or_else(|| format!("unbalanced parameter list in `{}`", code.trim()))?;
    let params = parse_parameters(&rest[..close])?;

    Ok(DefHeader {
        name,
        is_async,
        params,
    })
}

fn parse_def_prefix(input: &mut &str) -> ModalResult<(bool, String)> {
    let is_async = opt((|i: &mut &str| keyword(i, "async"), multispace0))
        .parse_next(input)?
        .is_some();
    keyword(input, "def")?;
    let _ = multispace0.parse_next(input)?;
    let name = identifier(input)?;
    let _ = multispace0.parse_next(input)?;
    '('.parse_next(input)?;
    Ok((is_async, name.to_string()))
}

fn parse_parameters(text: &str) -> Result<Vec<Parameter>, String> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;

    for item in split_top_level(text, b',') {
        if item.is_empty() {
            continue;
        }
        if item == "/" {
            for param in params.iter_mut() {
                if param.kind == ParameterKind::PositionalOrKeyword {
                    param.kind = ParameterKind::PositionalOnly;
                }
            }
            continue;
        }
        if item == "*" {
            keyword_only = true;
            continue;
        }

        let (kind, bare) = if let Some(stripped) = item.strip_prefix("**") {
            (ParameterKind::VarKeyword, stripped)
        } else if let Some(stripped) = item.strip_prefix('*') {
            keyword_only = true;
            (ParameterKind::VarPositional, stripped)
        } else if keyword_only {
            (ParameterKind::KeywordOnly, item)
        } else {
            (ParameterKind::PositionalOrKeyword, item)
        };

        let mut bare = bare.trim_start();
        let name = identifier
            .parse_next(&mut bare)
            .map_err(|_| format!("malformed parameter `{}`", item))?;
        params.push(Parameter {
            name: name.to_string(),
            kind,
        });
    }

    Ok(params)
}

/// Parse the class name from a `class` header.
pub fn parse_class_name(code: &str) -> Result<String, String> {
    let mut rest = code.trim_start();
    parse_class_prefix(&mut rest)
        .map_err(|_| format!("malformed class definition `{}`", code.trim()))
}

fn parse_class_prefix(input: &mut &str) -> ModalResult<String> {
    keyword(input, "class")?;
    let _ = multispace0.parse_next(input)?;
    identifier(input).map(str::to_string)
}

// ============================================================================
// Decorators
// ============================================================================

/// Keyword argument names of a `@given(...)` decorator, in order.
///
/// Returns `None` when the decorator is not a `given` call.
pub fn given_keywords(decorator: &str) -> Option<Vec<String>> {
    let body = decorator.trim().strip_prefix('@')?.trim_start();
    let body = body
        .strip_prefix("hypothesis.")
        .unwrap_or(body)
        .strip_prefix("given")?
        .trim_start()
        .strip_prefix('(')?;
    let close = find_closing(body)?;

    let names = split_top_level(&body[..close], b',')
        .into_iter()
        .filter_map(|arg| {
            let (name, _) = arg.split_once('=')?;
            let name = name.trim();
            let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
            valid.then(|| name.to_string())
        })
        .collect();
    Some(names)
}

// ============================================================================
// Lexical helpers
// ============================================================================

/// Parse a Python identifier.
fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    let checkpoint = *input;
    let word: &str =
        take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)?;
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        *input = checkpoint;
        return Err(ErrMode::from_input(input));
    }
    Ok(word)
}

/// Match a whole-word keyword.
fn keyword(input: &mut &str, expected: &str) -> ModalResult<()> {
    let checkpoint = *input;
    let word = identifier(input)?;
    if word == expected {
        Ok(())
    } else {
        *input = checkpoint;
        Err(ErrMode::from_input(input))
    }
}

// ============================================================================
// Tests
// ============================================================================
