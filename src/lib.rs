//! easypbt: property-based test scaffolding for Python functions.
//!
//! Given a Python source file, a testing pattern and the function(s) to test,
//! easypbt produces a `hypothesis` test skeleton, either synthesized locally
//! or delegated to the external `hypothesis write` generator, and merges it
//! into the module's test file without disturbing the code already there.

// Core infrastructure - re-exported from easypbt-core
pub use easypbt_core::config;
pub use easypbt_core::error;
pub use easypbt_core::types;

// Python source support
pub use easypbt_python as python;

// Output types (core envelope plus command responses)
pub mod output;

// Orchestration
pub mod generate;
pub mod generator;
pub mod testfile;

// Front door
pub mod cli;

// Error bridges - converts subsystem errors to PbtError
mod error_bridges;
