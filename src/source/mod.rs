//! Source adapters: turn each input mode into one candidate-puzzle sequence.
//!
//! Three input modes exist:
//!
//! - **Positions**: a JSONL stream of `{fen, site}` records, read in chunks
//! - **Games**: a PGN file, read fully into memory before generation
//! - **Self**: no input at all, the generator synthesizes puzzles
//!
//! Every adapter implements [`PuzzleSource`] and hands the generator strategy
//! one input unit at a time, preserving input order.

pub mod games;
pub mod positions;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::generator::PuzzleGenerator;
use crate::puzzle::CandidatePuzzle;

pub use games::{read_games, Game, GameMove, GamesSource};
pub use positions::{PositionsSource, SourceRecord, DEFAULT_CHUNK_SIZE};

/// Produces candidate puzzles by driving a generator over some input.
pub trait PuzzleSource {
    /// Short name of the input mode, used in logs.
    fn mode(&self) -> LoadMode;

    /// Runs the generator over every input unit and collects its puzzles.
    fn load(&self, generator: &dyn PuzzleGenerator) -> Result<Vec<CandidatePuzzle>, SourceError>;
}

/// How a puzzle type obtains its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    FromPositions,
    FromGames,
    FromSelf,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::FromPositions => write!(f, "from_positions"),
            LoadMode::FromGames => write!(f, "from_games"),
            LoadMode::FromSelf => write!(f, "from_self"),
        }
    }
}

/// Generator that needs no input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfSource;

impl PuzzleSource for SelfSource {
    fn mode(&self) -> LoadMode {
        LoadMode::FromSelf
    }

    fn load(&self, generator: &dyn PuzzleGenerator) -> Result<Vec<CandidatePuzzle>, SourceError> {
        Ok(generator.generate()?)
    }
}

/// Builds the adapter for a load mode from the configured input paths.
///
/// # Errors
///
/// Returns `SourceError::MissingPath` if the mode needs a path that is not configured.
pub fn build_source(
    mode: LoadMode,
    positions_path: Option<&Path>,
    games_path: Option<&Path>,
    chunk_size: usize,
) -> Result<Box<dyn PuzzleSource>, SourceError> {
    match mode {
        LoadMode::FromPositions => {
            let path = positions_path.ok_or_else(|| SourceError::MissingPath {
                mode: "positions".to_string(),
            })?;
            Ok(Box::new(
                PositionsSource::new(path).with_chunk_size(chunk_size),
            ))
        }
        LoadMode::FromGames => {
            let path = games_path.ok_or_else(|| SourceError::MissingPath {
                mode: "games".to_string(),
            })?;
            Ok(Box::new(GamesSource::new(path)))
        }
        LoadMode::FromSelf => Ok(Box::new(SelfSource)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::puzzle::Level;

    struct Fixed;

    impl PuzzleGenerator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
            Ok(vec![
                CandidatePuzzle::new(Level::Number(1)).with_fens(["4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1"]),
                CandidatePuzzle::new(Level::Number(2)).with_fens(["4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1"]),
            ])
        }
    }

    #[test]
    fn test_load_mode_serde() {
        let mode: LoadMode = serde_json::from_str("\"from_games\"").unwrap();
        assert_eq!(mode, LoadMode::FromGames);
        assert_eq!(LoadMode::FromPositions.to_string(), "from_positions");
    }

    #[test]
    fn test_self_source_passes_through() {
        let puzzles = SelfSource.load(&Fixed).unwrap();
        assert_eq!(puzzles.len(), 2);
        assert_eq!(puzzles[1].level, Level::Number(2));
    }

    #[test]
    fn test_build_source_missing_path() {
        let result = build_source(LoadMode::FromGames, None, None, 10);
        assert!(matches!(result, Err(SourceError::MissingPath { .. })));

        let source = build_source(LoadMode::FromSelf, None, None, 10).unwrap();
        assert_eq!(source.mode(), LoadMode::FromSelf);
    }
}
