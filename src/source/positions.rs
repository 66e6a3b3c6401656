//! Positions adapter: JSONL `{fen, site}` records read in bounded chunks.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;
use crate::generator::PuzzleGenerator;
use crate::puzzle::CandidatePuzzle;

use super::{LoadMode, PuzzleSource};

/// Default number of records handed to the generator per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// One line of a positions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub fen: String,
    pub site: String,
}

/// Reads positions in chunks of `chunk_size` records.
///
/// Chunking bounds how many records are held at once; every generated puzzle
/// is still accumulated into a single result.
#[derive(Debug, Clone)]
pub struct PositionsSource {
    path: PathBuf,
    chunk_size: usize,
}

impl PositionsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the chunk size. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn process_chunk(
        chunk: &mut Vec<SourceRecord>,
        generator: &dyn PuzzleGenerator,
        puzzles: &mut Vec<CandidatePuzzle>,
    ) -> Result<(), SourceError> {
        for record in chunk.drain(..) {
            for mut puzzle in generator.generate_from_position(&record.fen)? {
                if !puzzle.has_site() {
                    puzzle.site = Some(record.site.clone());
                }
                if puzzle.fens.is_empty() {
                    puzzle.fens = vec![record.fen.clone()];
                }
                puzzles.push(puzzle);
            }
        }
        Ok(())
    }
}

impl PuzzleSource for PositionsSource {
    fn mode(&self) -> LoadMode {
        LoadMode::FromPositions
    }

    fn load(&self, generator: &dyn PuzzleGenerator) -> Result<Vec<CandidatePuzzle>, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut puzzles = Vec::new();
        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut chunks = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record: SourceRecord =
                serde_json::from_str(&line).map_err(|e| SourceError::MalformedRecord {
                    path: self.path.clone(),
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            chunk.push(record);

            if chunk.len() >= self.chunk_size {
                Self::process_chunk(&mut chunk, generator, &mut puzzles)?;
                chunks += 1;
                debug!(chunk = chunks, puzzles = puzzles.len(), "Processed positions chunk");
            }
        }

        if !chunk.is_empty() {
            Self::process_chunk(&mut chunk, generator, &mut puzzles)?;
            chunks += 1;
        }

        debug!(
            path = %self.path.display(),
            chunks = chunks,
            puzzles = puzzles.len(),
            "Finished reading positions"
        );

        Ok(puzzles)
    }
}
