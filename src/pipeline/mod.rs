//! Pipeline orchestration for puzzle curation.
//!
//! # Architecture
//!
//! - **Config**: the YAML manifest naming paths and puzzle types
//! - **Orchestrator**: runs one puzzle type (or a batch) end to end
//!
//! # Pipeline Flow
//!
//! 1. **Idempotency check**: an existing artifact is kept unless overwriting
//! 2. **Load**: the source adapter drives the generator over its input
//! 3. **Flatten**: candidates become camelCase rows with derived counts
//! 4. **Prune**: numeric thresholds, board validity, bounded sample
//! 5. **Deduplicate**: repeated position sequences are dropped
//! 6. **Write**: rows grouped by level go to `<puzzles_dir>/<name>.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use puzzle_forge::generator::GeneratorRegistry;
//! use puzzle_forge::pipeline::{Manifest, Orchestrator};
//!
//! let manifest = Manifest::load(Path::new("puzzles.yaml"))?;
//! let orchestrator = Orchestrator::new(manifest, &GeneratorRegistry::new())?;
//!
//! let summary = orchestrator.run_batch(&orchestrator.names(), false);
//! println!("{} written, {} failed", summary.written(), summary.failed());
//! ```

pub mod config;
pub mod orchestrator;

pub use config::{ConfigError, Manifest, ManifestPaths, PuzzleTypeConfig};
pub use orchestrator::{
    BatchSummary, Orchestrator, PipelineError, RunReport, RunState, StageEvent, TypeOutcome,
};
