//! Distribution statistics for a curated table.
//!
//! [`TableStats`] summarizes how the final puzzle set spreads across
//! difficulty levels, board sizes and solution counts. The orchestrator logs
//! it just before writing and keeps it in the run report.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::table::Row;

/// Distribution statistics for a set of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableStats {
    /// Total number of rows analyzed.
    pub total: usize,

    /// Rows per level key.
    pub levels: BTreeMap<String, usize>,

    /// Rows per starting-board piece count.
    pub piece_counts: BTreeMap<u32, usize>,

    /// Rows per number of solutions.
    pub solution_counts: BTreeMap<usize, usize>,
}

impl TableStats {
    /// Computes distributions over `rows`.
    pub fn compute(rows: &[Row]) -> Self {
        let mut stats = Self {
            total: rows.len(),
            ..Self::default()
        };

        for row in rows {
            *stats.levels.entry(row.level().key()).or_insert(0) += 1;
            *stats.piece_counts.entry(row.piece_count()).or_insert(0) += 1;
            *stats.solution_counts.entry(row.solution_count()).or_insert(0) += 1;
        }

        stats
    }

    /// Mean starting-board piece count, or 0.0 for an empty table.
    pub fn mean_piece_count(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let pieces: u64 = self
            .piece_counts
            .iter()
            .map(|(&pieces, &count)| u64::from(pieces) * count as u64)
            .sum();
        pieces as f64 / self.total as f64
    }

    /// How evenly rows spread across levels (0.0 to 1.0).
    pub fn level_balance(&self) -> f64 {
        normalized_entropy(&self.levels)
    }

    /// Logs the distributions at info level.
    pub fn report(&self, puzzle: &str) {
        info!(
            puzzle = %puzzle,
            total = self.total,
            mean_piece_count = self.mean_piece_count(),
            level_balance = self.level_balance(),
            "Puzzle set statistics"
        );
        for (level, count) in &self.levels {
            info!(puzzle = %puzzle, level = %level, count = *count, "Level distribution");
        }
        for (pieces, count) in &self.piece_counts {
            info!(puzzle = %puzzle, piece_count = *pieces, count = *count, "Piece count distribution");
        }
        for (solutions, count) in &self.solution_counts {
            info!(
                puzzle = %puzzle,
                solution_count = *solutions,
                count = *count,
                "Solution count distribution"
            );
        }
    }
}

/// Calculates Shannon entropy for a distribution.
///
/// Higher entropy indicates more uniform distribution (more diverse).
pub fn shannon_entropy<K>(distribution: &BTreeMap<K, usize>) -> f64 {
    let total: usize = distribution.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;

    distribution
        .values()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total_f;
            -p * p.ln()
        })
        .sum()
}

/// Calculates normalized entropy (0.0 to 1.0).
///
/// Normalized by the maximum possible entropy for the given number of categories.
pub fn normalized_entropy<K>(distribution: &BTreeMap<K, usize>) -> f64 {
    let entropy = shannon_entropy(distribution);
    let max_entropy = (distribution.len() as f64).ln();

    if max_entropy > 0.0 {
        (entropy / max_entropy).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
