//! Pipeline orchestrator for curating puzzle types.
//!
//! For one puzzle type the orchestrator:
//! - skips the run when its artifact already exists (unless overwriting)
//! - drives the configured source adapter and generator
//! - flattens, prunes and deduplicates the candidates
//! - reports distribution statistics and writes the grouped artifact
//!
//! Every stage is recorded in the returned [`RunReport`]. Runs that end early
//! for lack of puzzles are skips, not errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::diversity::{Deduplicator, TableStats};
use crate::error::{ExportError, FlattenError, GeneratorError, SourceError};
use crate::export::{write_grouped, WriteSummary};
use crate::generator::{GeneratorRegistry, PuzzleGenerator};
use crate::prune::{PruneReport, Pruner};
use crate::rules::{BoardRules, StandardRules};
use crate::source::build_source;
use crate::table::flatten;

use super::config::{ConfigError, Manifest, PuzzleTypeConfig};

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A puzzle type's generator could not be resolved at startup.
    #[error("Cannot resolve generator for '{puzzle}': {source}")]
    Resolve {
        puzzle: String,
        #[source]
        source: GeneratorError,
    },

    /// Loading candidates failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A candidate puzzle could not be flattened.
    #[error("Flatten error: {0}")]
    Flatten(#[from] FlattenError),

    /// Writing the artifact failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Where a puzzle-type run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Loaded,
    Flattened,
    Pruned,
    Deduplicated,
    Written,
    /// Output already present and overwriting was not requested.
    SkippedExisting,
    /// The source adapter produced no candidates.
    SkippedNoCandidates,
    /// Nothing survived pruning or deduplication.
    SkippedEmptyAfterPrune,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Written) || self.is_skip()
    }

    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            RunState::SkippedExisting
                | RunState::SkippedNoCandidates
                | RunState::SkippedEmptyAfterPrune
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "not_started"),
            RunState::Loaded => write!(f, "loaded"),
            RunState::Flattened => write!(f, "flattened"),
            RunState::Pruned => write!(f, "pruned"),
            RunState::Deduplicated => write!(f, "deduplicated"),
            RunState::Written => write!(f, "written"),
            RunState::SkippedExisting => write!(f, "skipped_existing"),
            RunState::SkippedNoCandidates => write!(f, "skipped_no_candidates"),
            RunState::SkippedEmptyAfterPrune => write!(f, "skipped_empty_after_prune"),
        }
    }
}

/// One state transition with the row count at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub state: RunState,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Everything one puzzle-type run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub puzzle: String,
    pub state: RunState,
    pub output_path: PathBuf,
    pub events: Vec<StageEvent>,
    pub candidates: Option<usize>,
    pub prune: Option<PruneReport>,
    pub duplicates_dropped: Option<usize>,
    pub stats: Option<TableStats>,
    pub written: Option<WriteSummary>,
    pub elapsed_ms: u64,
}

impl RunReport {
    fn new(puzzle: &str, output_path: &Path) -> Self {
        Self {
            puzzle: puzzle.to_string(),
            state: RunState::NotStarted,
            output_path: output_path.to_path_buf(),
            events: Vec::new(),
            candidates: None,
            prune: None,
            duplicates_dropped: None,
            stats: None,
            written: None,
            elapsed_ms: 0,
        }
    }

    fn record(&mut self, state: RunState, rows: usize, detail: Option<&str>) {
        self.state = state;
        self.events.push(StageEvent {
            state,
            rows,
            detail: detail.map(str::to_string),
        });
    }

    fn finish(mut self, start: Instant) -> Self {
        self.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Result of one puzzle type within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct TypeOutcome {
    pub puzzle: String,
    /// Terminal state, or `failed`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TypeOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcomes of a batch, in request order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub outcomes: Vec<TypeOutcome>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                o.report
                    .as_ref()
                    .is_some_and(|r| r.state == RunState::Written)
            })
            .count()
    }
}

struct ResolvedType {
    config: PuzzleTypeConfig,
    generator: Arc<dyn PuzzleGenerator>,
}

/// Runs the curation pipeline for the puzzle types of one manifest.
pub struct Orchestrator {
    manifest: Manifest,
    types: BTreeMap<String, ResolvedType>,
    rules: Box<dyn BoardRules>,
    deduplicator: Deduplicator,
}

impl Orchestrator {
    /// Validates the manifest and resolves every puzzle type's generator.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if the manifest is invalid or a generator is
    /// not registered.
    pub fn new(manifest: Manifest, registry: &GeneratorRegistry) -> Result<Self, PipelineError> {
        manifest.validate()?;

        let mut types = BTreeMap::new();
        for (name, config) in &manifest.puzzles {
            let generator =
                registry
                    .resolve(&config.generator)
                    .map_err(|source| PipelineError::Resolve {
                        puzzle: name.clone(),
                        source,
                    })?;
            types.insert(
                name.clone(),
                ResolvedType {
                    config: config.clone(),
                    generator,
                },
            );
        }

        Ok(Self {
            manifest,
            types,
            rules: Box::new(StandardRules),
            deduplicator: Deduplicator::new(),
        })
    }

    /// Replaces the rules engine.
    pub fn with_rules(mut self, rules: impl BoardRules + 'static) -> Self {
        self.rules = Box::new(rules);
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Configured puzzle types, in order.
    pub fn names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Runs one puzzle type.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if the type is unknown, its input is malformed,
    /// a candidate cannot be flattened, or the artifact cannot be written.
    pub fn run(&self, puzzle: &str, overwrite: bool) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let resolved = self
            .types
            .get(puzzle)
            .ok_or_else(|| ConfigError::UnknownPuzzle(puzzle.to_string()))?;
        let config = &resolved.config;
        let output_path = self.manifest.output_path(puzzle);
        let mut report = RunReport::new(puzzle, &output_path);

        info!(puzzle = %puzzle, load = %config.load, generator = %resolved.generator.name(), "Running pipeline");

        if output_path.exists() && !overwrite {
            info!(
                puzzle = %puzzle,
                path = %output_path.display(),
                "Skipping existing output, use --overwrite-assets to force"
            );
            report.record(RunState::SkippedExisting, 0, Some("output exists"));
            return Ok(report.finish(start));
        }

        let paths = &self.manifest.paths;
        let source = build_source(
            config.load,
            paths.source_positions_path.as_deref(),
            paths.source_games_path.as_deref(),
            paths.positions_chunk_size,
        )?;
        let candidates = source.load(resolved.generator.as_ref())?;
        report.candidates = Some(candidates.len());
        report.record(RunState::Loaded, candidates.len(), None);

        if candidates.is_empty() {
            error!(
                puzzle = %puzzle,
                path = %output_path.display(),
                "Zero candidate puzzles generated, skipping"
            );
            report.record(RunState::SkippedNoCandidates, 0, Some("no candidates"));
            return Ok(report.finish(start));
        }
        info!(puzzle = %puzzle, candidates = candidates.len(), "Generated candidate puzzles");

        let table = flatten(&candidates, self.rules.as_ref())?;
        report.record(RunState::Flattened, table.len(), None);
        drop(candidates);

        let outcome = Pruner::new(config.prune.clone()).prune(puzzle, table, self.rules.as_ref());
        info!(puzzle = %puzzle, pruned = outcome.report.pruned(), "Pruned puzzles");
        report.prune = Some(outcome.report);
        report.record(RunState::Pruned, outcome.table.len(), None);

        if outcome.table.is_empty() {
            error!(
                puzzle = %puzzle,
                path = %output_path.display(),
                "Zero puzzles left after pruning, skipping"
            );
            report.record(RunState::SkippedEmptyAfterPrune, 0, Some("nothing survived pruning"));
            return Ok(report.finish(start));
        }

        let dedup = self.deduplicator.deduplicate(outcome.table);
        if dedup.dropped_count() > 0 {
            warn!(
                puzzle = %puzzle,
                dropped = dedup.dropped_count(),
                "Dropped duplicate positions"
            );
        }
        report.duplicates_dropped = Some(dedup.dropped_count());
        report.record(RunState::Deduplicated, dedup.kept.len(), None);

        let table = dedup.kept;
        if table.is_empty() {
            error!(
                puzzle = %puzzle,
                path = %output_path.display(),
                "Zero puzzles left after deduplication, skipping"
            );
            report.record(
                RunState::SkippedEmptyAfterPrune,
                0,
                Some("nothing survived deduplication"),
            );
            return Ok(report.finish(start));
        }
        info!(puzzle = %puzzle, selected = table.len(), "Selected puzzles");

        let stats = TableStats::compute(&table);
        stats.report(puzzle);
        report.stats = Some(stats);

        let summary = write_grouped(table, &output_path)?;
        report.record(RunState::Written, summary.rows, None);
        report.written = Some(summary);

        Ok(report.finish(start))
    }

    /// Runs several puzzle types one after another.
    ///
    /// A failing type is logged and recorded; the remaining types still run.
    pub fn run_batch<S: AsRef<str>>(&self, puzzles: &[S], overwrite: bool) -> BatchSummary {
        let outcomes = puzzles
            .iter()
            .map(|puzzle| {
                let puzzle = puzzle.as_ref();
                match self.run(puzzle, overwrite) {
                    Ok(report) => TypeOutcome {
                        puzzle: puzzle.to_string(),
                        status: report.state.to_string(),
                        report: Some(report),
                        error: None,
                    },
                    Err(e) => {
                        error!(puzzle = %puzzle, error = %e, "Pipeline failed");
                        TypeOutcome {
                            puzzle: puzzle.to_string(),
                            status: "failed".to_string(),
                            report: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();

        BatchSummary { outcomes }
    }
}
