//! puzzle-forge: offline curation of chess puzzle sets.
//!
//! Candidate puzzles produced by a generation strategy are flattened into
//! rows, pruned by board and solution thresholds, deduplicated by position
//! sequence, grouped by difficulty level and written as one JSON artifact
//! per puzzle type.

// Core modules
pub mod cli;
pub mod diversity;
pub mod error;
pub mod export;
pub mod generator;
pub mod pipeline;
pub mod prune;
pub mod puzzle;
pub mod rules;
pub mod source;
pub mod table;

// Re-export commonly used types
pub use error::{ExportError, FlattenError, GeneratorError, SourceError};
pub use generator::{GeneratorRegistry, GeneratorSpec, PuzzleGenerator};
pub use pipeline::{Manifest, Orchestrator, PipelineError, RunReport, RunState};
pub use puzzle::{CandidatePuzzle, Level};
pub use rules::{BoardRules, StandardRules};
pub use table::{Row, Table};
