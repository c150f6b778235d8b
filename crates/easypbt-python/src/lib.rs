//! Python source support for easypbt.
//!
//! Everything here works on source text, without a Python interpreter:
//!
//! - [`lexer`] / [`outline`]: logical lines and block structure
//! - [`imports`] / [`rewrite`]: the import-structure model and rewriting a
//!   file around a merged import header
//! - [`extract`]: function discovery and parameter extraction
//! - [`pattern`] / [`synth`]: the pattern catalog and bespoke skeletons
//! - [`postprocess`]: reshaping baseline generator output
//! - [`snippet`]: editor placeholders and strategy menus

pub mod error;
pub mod extract;
pub mod imports;
pub mod lexer;
pub mod outline;
pub mod pattern;
pub mod postprocess;
pub mod rewrite;
pub mod snippet;
pub mod synth;
pub mod syntax;
pub mod validation;

pub use error::{SourceError, SourceResult};
pub use extract::{FunctionDescriptor, SutSignature};
pub use imports::{parse_imports, ImportEntry, ImportStructure, MaybeAlias};
pub use pattern::{Dispatch, PatternInfo, PatternKind};
pub use rewrite::{Rewriter, GHOSTWRITER_BANNER};
pub use snippet::StrategyCatalog;
