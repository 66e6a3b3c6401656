//! Candidate puzzles to rows.

use serde_json::{Map, Value};

use crate::error::FlattenError;
use crate::puzzle::CandidatePuzzle;
use crate::rules::BoardRules;

use super::{Row, Table, PIECE_COUNT, SOLUTION_COUNT};

/// Converts a `snake_case` key to `camelCase`.
///
/// The first segment is kept as-is; each later segment gets an upper-case
/// first letter and a lower-cased remainder. Empty segments vanish.
pub fn to_camel(name: &str) -> String {
    let mut segments = name.split('_');
    let mut out = segments.next().unwrap_or_default().to_string();

    for segment in segments {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }

    out
}

/// Flattens candidate puzzles into rows, one per puzzle and in input order.
///
/// Every key is renamed with [`to_camel`]; `solutionCount` and `pieceCount`
/// are computed from the puzzle itself and override any same-named field.
///
/// # Errors
///
/// Returns `FlattenError::MalformedPuzzle` if a puzzle has no positions or
/// the rules engine cannot count pieces on its starting position.
pub fn flatten(puzzles: &[CandidatePuzzle], rules: &dyn BoardRules) -> Result<Table, FlattenError> {
    puzzles
        .iter()
        .enumerate()
        .map(|(index, puzzle)| flatten_one(index, puzzle, rules))
        .collect()
}

fn flatten_one(
    index: usize,
    puzzle: &CandidatePuzzle,
    rules: &dyn BoardRules,
) -> Result<Row, FlattenError> {
    let start = puzzle.start_fen().ok_or_else(|| FlattenError::MalformedPuzzle {
        index,
        reason: "no positions".to_string(),
    })?;
    let piece_count = rules
        .count_pieces(start)
        .ok_or_else(|| FlattenError::MalformedPuzzle {
            index,
            reason: format!("cannot count pieces on '{}'", start),
        })?;
    let solution_count = puzzle.solutions.len();

    let Value::Object(record) = serde_json::to_value(puzzle)? else {
        return Err(FlattenError::MalformedPuzzle {
            index,
            reason: "puzzle did not serialize to an object".to_string(),
        });
    };

    let mut fields: Map<String, Value> = record
        .into_iter()
        .map(|(key, value)| (to_camel(&key), value))
        .collect();
    fields.insert(SOLUTION_COUNT.to_string(), Value::from(solution_count));
    fields.insert(PIECE_COUNT.to_string(), Value::from(piece_count));

    Ok(Row::from_parts(
        puzzle.fens.clone(),
        solution_count,
        piece_count,
        puzzle.level.clone(),
        fields,
    ))
}
