//! Exact-duplicate removal keyed on the full position sequence.

use std::collections::HashSet;

use crate::table::{Row, Table};

/// Drops rows whose `fens` sequence already appeared earlier in the table.
///
/// First occurrence wins and the relative order of kept rows is preserved,
/// so running it twice is the same as running it once.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator;

/// Result of a deduplication operation.
#[derive(Debug, Clone)]
pub struct DeduplicationResult {
    /// Rows that were kept, in first-seen order.
    pub kept: Table,

    /// Rows that repeated an earlier position sequence.
    pub dropped: Vec<Row>,

    /// Total number of rows before deduplication.
    pub total_before: usize,
}

impl DeduplicationResult {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// Returns the deduplication ratio (dropped / total).
    pub fn dedup_ratio(&self) -> f64 {
        if self.total_before == 0 {
            return 0.0;
        }
        self.dropped.len() as f64 / self.total_before as f64
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    pub fn deduplicate(&self, table: Table) -> DeduplicationResult {
        let total_before = table.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(total_before);
        let mut kept = Vec::with_capacity(total_before);
        let mut dropped = Vec::new();

        for row in table {
            if seen.insert(row.fens().to_vec()) {
                kept.push(row);
            } else {
                dropped.push(row);
            }
        }

        DeduplicationResult {
            kept,
            dropped,
            total_before,
        }
    }
}
