//! Level-grouped JSON artifact: `{"<level>": [row, ...], ...}`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::ExportError;
use crate::table::Row;

/// Rows partitioned by level key, in table order within each group.
pub type GroupedRows = BTreeMap<String, Vec<Row>>;

/// What a write produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows: usize,
    /// Rows written per level key.
    pub levels: BTreeMap<String, usize>,
}

/// Partitions rows by [`Level::key`](crate::puzzle::Level::key).
pub fn group_by_level(rows: Vec<Row>) -> GroupedRows {
    rows.into_iter().fold(BTreeMap::new(), |mut groups, row| {
        groups.entry(row.level().key()).or_insert_with(Vec::new).push(row);
        groups
    })
}

/// Writes rows grouped by level to `path`, replacing any existing file.
///
/// The parent directory is created when missing.
///
/// # Errors
///
/// Returns `ExportError` if the directory or file cannot be written.
pub fn write_grouped(rows: Vec<Row>, path: &Path) -> Result<WriteSummary, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let total = rows.len();
    let groups = group_by_level(rows);
    let levels = groups
        .iter()
        .map(|(level, rows)| (level.clone(), rows.len()))
        .collect();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &groups)?;
    writer.flush()?;

    info!(rows = total, path = %path.display(), "Wrote puzzles");

    Ok(WriteSummary {
        path: path.to_path_buf(),
        rows: total,
        levels,
    })
}

/// Reads a grouped artifact back.
///
/// # Errors
///
/// Returns `ExportError::InvalidArtifact` if the file is not a level-grouped
/// collection of rows.
pub fn read_artifact(path: &Path) -> Result<GroupedRows, ExportError> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| ExportError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
