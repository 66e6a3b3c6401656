//! Row-set shaping after pruning: sampling, deduplication and statistics.
//!
//! - [`BoundedSampler`] keeps a uniform random subset of bounded size
//! - [`Deduplicator`] drops rows repeating an earlier position sequence
//! - [`TableStats`] summarizes level, piece and solution distributions

pub mod dedup;
pub mod metrics;
pub mod sampling;

pub use dedup::{DeduplicationResult, Deduplicator};
pub use metrics::{normalized_entropy, shannon_entropy, TableStats};
pub use sampling::BoundedSampler;
