//! Command-line interface for puzzle-forge.
//!
//! Provides commands for running the curation pipeline, validating
//! persisted artifacts, and listing manifest contents.

mod commands;

pub use commands::{parse_cli, run_with_cli, run_with_registry, Cli, Commands};
