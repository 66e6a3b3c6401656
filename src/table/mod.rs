//! Flat, tabular puzzle rows.
//!
//! A [`Row`] is the field map that ends up in the persisted artifact, plus
//! typed copies of the few fields the curation stages read (positions, counts,
//! level). Rows are only built by the flattener or by reading an artifact back,
//! so the typed copies always agree with the field map.

pub mod flatten;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::puzzle::Level;

pub use flatten::{flatten, to_camel};

/// Field holding the position sequence.
pub const FENS: &str = "fens";
/// Field holding the solution list.
pub const SOLUTIONS: &str = "solutions";
/// Field holding the difficulty level.
pub const LEVEL: &str = "level";
/// Derived field: number of solutions.
pub const SOLUTION_COUNT: &str = "solutionCount";
/// Derived field: pieces on the starting board.
pub const PIECE_COUNT: &str = "pieceCount";

/// Ordered sequence of rows.
pub type Table = Vec<Row>;

/// Errors reading a row back from a field map.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// One flattened puzzle.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    fens: Vec<String>,
    solution_count: usize,
    piece_count: u32,
    level: Level,
    fields: Map<String, Value>,
}

impl Row {
    pub(crate) fn from_parts(
        fens: Vec<String>,
        solution_count: usize,
        piece_count: u32,
        level: Level,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            fens,
            solution_count,
            piece_count,
            level,
            fields,
        }
    }

    /// Rebuilds a row from a persisted field map.
    ///
    /// # Errors
    ///
    /// Returns `RowError` if `fens`, `solutionCount`, `pieceCount` or `level`
    /// is missing or has the wrong shape.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, RowError> {
        let fens = match fields.get(FENS) {
            Some(value) => serde_json::from_value::<Vec<String>>(value.clone()).map_err(|e| {
                RowError::InvalidField {
                    field: FENS,
                    reason: e.to_string(),
                }
            })?,
            None => return Err(RowError::MissingField(FENS)),
        };

        let solution_count = count_field(&fields, SOLUTION_COUNT)?;
        let piece_count =
            u32::try_from(count_field(&fields, PIECE_COUNT)?).map_err(|e| RowError::InvalidField {
                field: PIECE_COUNT,
                reason: e.to_string(),
            })?;

        let level = match fields.get(LEVEL) {
            Some(value) => {
                serde_json::from_value::<Level>(value.clone()).map_err(|e| RowError::InvalidField {
                    field: LEVEL,
                    reason: e.to_string(),
                })?
            }
            None => return Err(RowError::MissingField(LEVEL)),
        };

        Ok(Self {
            fens,
            solution_count,
            piece_count,
            level,
            fields,
        })
    }

    /// Full position sequence; the deduplication key.
    pub fn fens(&self) -> &[String] {
        &self.fens
    }

    /// Starting position.
    pub fn start_fen(&self) -> Option<&str> {
        self.fens.first().map(String::as_str)
    }

    pub fn solution_count(&self) -> usize {
        self.solution_count
    }

    pub fn piece_count(&self) -> u32 {
        self.piece_count
    }

    /// Pieces per solution, or `None` when the row has no solutions.
    pub fn pieces_per_solution(&self) -> Option<f64> {
        if self.solution_count == 0 {
            return None;
        }
        Some(f64::from(self.piece_count) / self.solution_count as f64)
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Looks up any field by its camelCase name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

fn count_field(fields: &Map<String, Value>, field: &'static str) -> Result<usize, RowError> {
    let value = fields.get(field).ok_or(RowError::MissingField(field))?;
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| RowError::InvalidField {
            field,
            reason: format!("expected a non-negative integer, got {}", value),
        })
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::deserialize(deserializer)?;
        Row::from_fields(fields).map_err(D::Error::custom)
    }
}
