//! Pruning engine: numeric thresholds, a board validity check, then a
//! bounded random sample.
//!
//! Stages run in order and each one only sees the survivors of the previous:
//!
//! 1. **Numeric**: solution count, piece count and pieces-per-solution must sit
//!    inside their inclusive ranges. Rows without solutions never pass.
//! 2. **Validity**: the starting position must be legal and not already over.
//! 3. **Sample**: at most `sample_size` rows are kept, chosen uniformly.
//!
//! A `passthrough` config skips all three stages and keeps every row.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diversity::BoundedSampler;
use crate::rules::BoardRules;
use crate::table::{Row, Table};

pub const DEFAULT_MIN_PIECE_COUNT: u32 = 4;
pub const DEFAULT_MAX_PIECE_COUNT: u32 = 24;
pub const DEFAULT_MIN_SOLUTION_COUNT: usize = 1;
pub const DEFAULT_MAX_SOLUTION_COUNT: usize = 4;
pub const DEFAULT_MIN_PIECE_PER_SOLUTION: f64 = 2.0;
pub const DEFAULT_MAX_PIECE_PER_SOLUTION: f64 = 12.0;
pub const DEFAULT_SAMPLE_SIZE: usize = 2000;

/// Which pruner a puzzle type uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneKind {
    /// Thresholds, validity and sampling.
    #[default]
    Thresholds,
    /// Every row is kept unchanged.
    Passthrough,
}

impl std::fmt::Display for PruneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneKind::Thresholds => write!(f, "thresholds"),
            PruneKind::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Thresholds for one puzzle type. Missing manifest fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    pub kind: PruneKind,
    pub min_piece_count: u32,
    pub max_piece_count: u32,
    pub min_solution_count: usize,
    pub max_solution_count: usize,
    pub min_piece_per_solution: f64,
    pub max_piece_per_solution: f64,
    /// Upper bound on rows kept by the final sample.
    pub sample_size: usize,
    /// Seed for the sample; unset means a fresh random draw every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            kind: PruneKind::Thresholds,
            min_piece_count: DEFAULT_MIN_PIECE_COUNT,
            max_piece_count: DEFAULT_MAX_PIECE_COUNT,
            min_solution_count: DEFAULT_MIN_SOLUTION_COUNT,
            max_solution_count: DEFAULT_MAX_SOLUTION_COUNT,
            min_piece_per_solution: DEFAULT_MIN_PIECE_PER_SOLUTION,
            max_piece_per_solution: DEFAULT_MAX_PIECE_PER_SOLUTION,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: None,
        }
    }
}

impl PruneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A config that keeps every row.
    pub fn passthrough() -> Self {
        Self {
            kind: PruneKind::Passthrough,
            ..Self::default()
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.kind == PruneKind::Passthrough
    }

    pub fn with_piece_count(mut self, min: u32, max: u32) -> Self {
        self.min_piece_count = min;
        self.max_piece_count = max;
        self
    }

    pub fn with_solution_count(mut self, min: usize, max: usize) -> Self {
        self.min_solution_count = min;
        self.max_solution_count = max;
        self
    }

    pub fn with_piece_per_solution(mut self, min: f64, max: f64) -> Self {
        self.min_piece_per_solution = min;
        self.max_piece_per_solution = max;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that every range is well formed and the sample is non-empty.
    /// Passthrough configs ignore their thresholds and always validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_passthrough() {
            return Ok(());
        }
        if self.min_piece_count > self.max_piece_count {
            return Err(format!(
                "min_piece_count ({}) exceeds max_piece_count ({})",
                self.min_piece_count, self.max_piece_count
            ));
        }
        if self.min_solution_count > self.max_solution_count {
            return Err(format!(
                "min_solution_count ({}) exceeds max_solution_count ({})",
                self.min_solution_count, self.max_solution_count
            ));
        }
        if !self.min_piece_per_solution.is_finite() || !self.max_piece_per_solution.is_finite() {
            return Err("piece-per-solution bounds must be finite".to_string());
        }
        if self.min_piece_per_solution > self.max_piece_per_solution {
            return Err(format!(
                "min_piece_per_solution ({}) exceeds max_piece_per_solution ({})",
                self.min_piece_per_solution, self.max_piece_per_solution
            ));
        }
        if self.sample_size == 0 {
            return Err("sample_size must be at least 1".to_string());
        }
        Ok(())
    }

    /// Stage 1 predicate.
    pub fn passes_thresholds(&self, row: &Row) -> bool {
        let Some(ratio) = row.pieces_per_solution() else {
            return false;
        };
        (self.min_solution_count..=self.max_solution_count).contains(&row.solution_count())
            && (self.min_piece_count..=self.max_piece_count).contains(&row.piece_count())
            && ratio >= self.min_piece_per_solution
            && ratio <= self.max_piece_per_solution
    }
}

/// Row counts seen by each pruning stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub input: usize,
    pub after_thresholds: usize,
    pub after_validity: usize,
    pub sampled: usize,
}

impl PruneReport {
    /// Rows removed across all stages.
    pub fn pruned(&self) -> usize {
        self.input.saturating_sub(self.sampled)
    }
}

/// Pruned table plus per-stage counts.
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    pub table: Table,
    pub report: PruneReport,
}

/// Applies a [`PruneConfig`] to a table.
#[derive(Debug, Clone, Default)]
pub struct Pruner {
    config: PruneConfig,
}

impl Pruner {
    pub fn new(config: PruneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PruneConfig {
        &self.config
    }

    /// Runs the three stages. `puzzle` only labels log lines.
    pub fn prune(&self, puzzle: &str, table: Table, rules: &dyn BoardRules) -> PruneOutcome {
        let input = table.len();

        if self.config.is_passthrough() {
            info!(puzzle = %puzzle, count = input, "Kept all puzzles");
            return PruneOutcome {
                table,
                report: PruneReport {
                    input,
                    after_thresholds: input,
                    after_validity: input,
                    sampled: input,
                },
            };
        }

        let mut table = table;
        table.retain(|row| self.config.passes_thresholds(row));
        let after_thresholds = table.len();
        debug!(
            puzzle = %puzzle,
            input = input,
            kept = after_thresholds,
            "Applied numeric thresholds"
        );

        table.retain(|row| row.start_fen().is_some_and(|fen| rules.is_playable(fen)));
        let after_validity = table.len();
        info!(
            puzzle = %puzzle,
            count = after_validity,
            "Found interesting puzzles"
        );

        let sampler =
            BoundedSampler::new(self.config.sample_size).with_optional_seed(self.config.seed);
        let table = sampler.sample(table);
        let sampled = table.len();

        PruneOutcome {
            table,
            report: PruneReport {
                input,
                after_thresholds,
                after_validity,
                sampled,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::puzzle::Level;
    use crate::rules::StandardRules;

    // 4 pieces, legal, not over
    const ROOK_ENDGAME: &str = "4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1";
    // 6 pieces, black is mated
    const BACK_RANK_MATE: &str = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";
    // 6 pieces, two white kings
    const TWO_WHITE_KINGS: &str = "4K3/8/8/8/8/8/PPPP4/4K3 w - - 0 1";
    // 8 pieces, legal
    const MIDDLEGAME: &str = "r3k3/pp6/8/8/8/8/PP6/R3K3 w - - 0 1";

    fn row(fen: &str, pieces: u32, solutions: usize) -> Row {
        Row::from_parts(vec![fen.to_string()], solutions, pieces, Level::Number(1), Map::new())
    }

    #[test]
    fn test_default_config() {
        let config = PruneConfig::default();
        assert_eq!(config.kind, PruneKind::Thresholds);
        assert_eq!(config.min_piece_count, 4);
        assert_eq!(config.max_piece_count, 24);
        assert_eq!(config.min_solution_count, 1);
        assert_eq!(config.max_solution_count, 4);
        assert_eq!(config.min_piece_per_solution, 2.0);
        assert_eq!(config.max_piece_per_solution, 12.0);
        assert_eq!(config.sample_size, 2000);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_takes_defaults() {
        let config: PruneConfig = serde_yaml::from_str("max_piece_count: 16\nseed: 7").unwrap();
        assert_eq!(config.max_piece_count, 16);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.min_piece_count, 4);
        assert_eq!(config.sample_size, 2000);
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        assert!(PruneConfig::new().with_piece_count(10, 5).validate().is_err());
        assert!(PruneConfig::new().with_solution_count(3, 1).validate().is_err());
        assert!(PruneConfig::new()
            .with_piece_per_solution(8.0, 2.0)
            .validate()
            .is_err());
        assert!(PruneConfig::new().with_sample_size(0).validate().is_err());
    }

    #[test]
    fn test_thresholds() {
        let config = PruneConfig::default();
        assert!(config.passes_thresholds(&row(ROOK_ENDGAME, 4, 1)));
        assert!(config.passes_thresholds(&row(ROOK_ENDGAME, 24, 2)));
        // too few pieces
        assert!(!config.passes_thresholds(&row(ROOK_ENDGAME, 3, 1)));
        // too many solutions
        assert!(!config.passes_thresholds(&row(ROOK_ENDGAME, 8, 5)));
        // 13 pieces per solution
        assert!(!config.passes_thresholds(&row(ROOK_ENDGAME, 13, 1)));
        // 1.5 pieces per solution
        assert!(!config.passes_thresholds(&row(ROOK_ENDGAME, 6, 4)));
    }

    #[test]
    fn test_zero_solutions_never_pass() {
        let config = PruneConfig::new().with_solution_count(0, 4);
        assert!(!config.passes_thresholds(&row(ROOK_ENDGAME, 8, 0)));
    }

    #[test]
    fn test_prune_stages() {
        let table = vec![
            row(ROOK_ENDGAME, 4, 1),
            row(BACK_RANK_MATE, 6, 1),
            row(TWO_WHITE_KINGS, 6, 1),
            row(MIDDLEGAME, 8, 0),
            row(MIDDLEGAME, 8, 2),
        ];

        let outcome = Pruner::new(PruneConfig::new().with_seed(3)).prune(
            "test",
            table,
            &StandardRules,
        );

        assert_eq!(
            outcome.report,
            PruneReport {
                input: 5,
                after_thresholds: 4,
                after_validity: 2,
                sampled: 2,
            }
        );
        assert_eq!(outcome.report.pruned(), 3);
        for row in &outcome.table {
            assert!(PruneConfig::default().passes_thresholds(row));
            assert!(StandardRules.is_playable(row.start_fen().unwrap()));
        }
    }

    #[test]
    fn test_prune_sample_bound() {
        let table: Table = (0..30).map(|_| row(ROOK_ENDGAME, 4, 1)).collect();

        let outcome = Pruner::new(PruneConfig::new().with_sample_size(10)).prune(
            "test",
            table,
            &StandardRules,
        );

        assert_eq!(outcome.report.after_validity, 30);
        assert_eq!(outcome.table.len(), 10);
        assert_eq!(outcome.report.sampled, 10);
    }

    #[test]
    fn test_passthrough_yaml() {
        let config: PruneConfig = serde_yaml::from_str("kind: passthrough").unwrap();
        assert!(config.is_passthrough());
        assert!(config.validate().is_ok());

        let config: PruneConfig =
            serde_yaml::from_str("kind: passthrough\nsample_size: 0").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_passthrough_keeps_every_row() {
        let table: Table = vec![
            row(ROOK_ENDGAME, 4, 1),
            row(BACK_RANK_MATE, 6, 1),
            row(TWO_WHITE_KINGS, 6, 1),
            row(MIDDLEGAME, 8, 0),
        ];
        let big: Table = (0..2500).map(|_| row(ROOK_ENDGAME, 4, 1)).collect();

        let outcome = Pruner::new(PruneConfig::passthrough()).prune("test", table, &StandardRules);

        assert_eq!(outcome.table.len(), 4);
        assert_eq!(outcome.table[1].start_fen(), Some(BACK_RANK_MATE));
        assert_eq!(outcome.table[3].solution_count(), 0);
        assert_eq!(
            outcome.report,
            PruneReport {
                input: 4,
                after_thresholds: 4,
                after_validity: 4,
                sampled: 4,
            }
        );
        assert_eq!(outcome.report.pruned(), 0);

        let outcome = Pruner::new(PruneConfig::passthrough()).prune("test", big, &StandardRules);
        assert_eq!(outcome.table.len(), 2500);
    }
}
