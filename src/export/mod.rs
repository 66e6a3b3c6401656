//! Export of curated puzzle sets.
//!
//! Provides the level-grouped JSON writer, its reader, and schema validation
//! for artifacts already on disk.

pub mod grouped;
pub mod validate;

pub use grouped::{group_by_level, read_artifact, write_grouped, GroupedRows, WriteSummary};
pub use validate::{
    validate_artifact, validate_value, ArtifactIssue, ValidationReport, MAX_REPORTED_ISSUES,
};
