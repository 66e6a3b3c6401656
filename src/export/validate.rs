//! Schema checks for persisted artifacts.
//!
//! Unlike [`read_artifact`](super::read_artifact), which stops at the first
//! problem, validation walks the whole file and collects every issue so an
//! operator can fix a broken artifact in one pass.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ExportError;
use crate::table::{FENS, LEVEL, PIECE_COUNT, SOLUTIONS, SOLUTION_COUNT};

/// Issues listed per file before the rest are summarized.
pub const MAX_REPORTED_ISSUES: usize = 10;

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactIssue {
    /// Where in the artifact, e.g. `2[5].pieceCount`.
    pub location: String,
    pub message: String,
}

impl ArtifactIssue {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ArtifactIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// Validation outcome for one artifact file.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub groups: usize,
    pub rows: usize,
    pub issues: Vec<ArtifactIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validates the artifact at `path`.
///
/// # Errors
///
/// Returns `ExportError` only when the file cannot be read. A file that is
/// not JSON is reported as an issue.
pub fn validate_artifact(path: &Path) -> Result<ValidationReport, ExportError> {
    let text = fs::read_to_string(path)?;

    let mut report = ValidationReport {
        path: path.to_path_buf(),
        groups: 0,
        rows: 0,
        issues: Vec::new(),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => {
            let (groups, rows, issues) = validate_value(&value);
            report.groups = groups;
            report.rows = rows;
            report.issues = issues;
        }
        Err(e) => report
            .issues
            .push(ArtifactIssue::new("", format!("not valid JSON: {}", e))),
    }

    Ok(report)
}

/// Checks an already-parsed artifact. Returns `(groups, rows, issues)`.
pub fn validate_value(value: &Value) -> (usize, usize, Vec<ArtifactIssue>) {
    let mut issues = Vec::new();

    let Some(groups) = value.as_object() else {
        issues.push(ArtifactIssue::new(
            "",
            "top level must be an object of level -> puzzles",
        ));
        return (0, 0, issues);
    };

    let mut rows = 0;
    for (level, puzzles) in groups {
        let Some(puzzles) = puzzles.as_array() else {
            issues.push(ArtifactIssue::new(level.as_str(), "group must be an array"));
            continue;
        };

        for (index, puzzle) in puzzles.iter().enumerate() {
            rows += 1;
            let location = format!("{}[{}]", level, index);
            match puzzle.as_object() {
                Some(fields) => check_row(level, &location, fields, &mut issues),
                None => issues.push(ArtifactIssue::new(location, "puzzle must be an object")),
            }
        }
    }

    (groups.len(), rows, issues)
}

fn check_row(group: &str, location: &str, row: &Map<String, Value>, issues: &mut Vec<ArtifactIssue>) {
    let at = |field: &str| format!("{}.{}", location, field);

    match row.get(FENS).and_then(Value::as_array) {
        Some(fens) if fens.is_empty() => {
            issues.push(ArtifactIssue::new(at(FENS), "must not be empty"));
        }
        Some(fens) if !fens.iter().all(Value::is_string) => {
            issues.push(ArtifactIssue::new(at(FENS), "must contain only strings"));
        }
        Some(_) => {}
        None => issues.push(ArtifactIssue::new(at(FENS), "missing or not an array")),
    }

    let solutions = row.get(SOLUTIONS).and_then(Value::as_array);
    if solutions.is_none() {
        issues.push(ArtifactIssue::new(at(SOLUTIONS), "missing or not an array"));
    }

    match row.get(SOLUTION_COUNT).and_then(Value::as_u64) {
        Some(count) => {
            if let Some(solutions) = solutions {
                if count != solutions.len() as u64 {
                    issues.push(ArtifactIssue::new(
                        at(SOLUTION_COUNT),
                        format!("is {} but there are {} solutions", count, solutions.len()),
                    ));
                }
            }
        }
        None => issues.push(ArtifactIssue::new(
            at(SOLUTION_COUNT),
            "missing or not a non-negative integer",
        )),
    }

    if row.get(PIECE_COUNT).and_then(Value::as_u64).is_none() {
        issues.push(ArtifactIssue::new(
            at(PIECE_COUNT),
            "missing or not a non-negative integer",
        ));
    }

    let key = match row.get(LEVEL) {
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    match key {
        Some(key) if key != group => issues.push(ArtifactIssue::new(
            at(LEVEL),
            format!("'{}' does not match its group '{}'", key, group),
        )),
        Some(_) => {}
        None => issues.push(ArtifactIssue::new(
            at(LEVEL),
            "missing or not an integer or string",
        )),
    }
}
