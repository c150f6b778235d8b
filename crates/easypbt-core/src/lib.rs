//! Core infrastructure for easypbt.
//!
//! This crate provides the language-agnostic pieces shared by the
//! Python support crate and the CLI:
//! - Error types and stable error codes
//! - JSON output types for CLI responses
//! - Layered configuration (defaults, environment, CLI flags)
//! - Small shared value types

pub mod config;
pub mod error;
pub mod output;
pub mod types;
