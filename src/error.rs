//! Error types for puzzle-forge operations.
//!
//! Defines the error types for each curation stage:
//! - Source loading (positions and games files)
//! - Puzzle generation strategies
//! - Record flattening
//! - Artifact export and validation

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading candidate puzzles from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Malformed input in '{path}': {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Malformed record at {path}:{line}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("No {mode} path configured")]
    MissingPath { mode: String },

    #[error("Failed to open source '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur inside a puzzle generation strategy.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Generator '{generator}' does not accept {input} input")]
    UnsupportedInput { generator: String, input: String },

    #[error("Generator '{0}' is not registered")]
    Unregistered(String),

    #[error("Generation failed: {0}")]
    Failed(String),

    #[error("Invalid puzzle record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while flattening candidate puzzles into rows.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("Malformed puzzle #{index}: {reason}")]
    MalformedPuzzle { index: usize, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during artifact export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid artifact '{path}': {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Failed to create output directory {path:?}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
