//! Replays candidate puzzles produced ahead of time by an external generator.
//!
//! The file is JSONL, one `snake_case` candidate puzzle per line, loaded on
//! first use and cached for the remaining calls.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::GeneratorError;
use crate::puzzle::CandidatePuzzle;
use crate::source::Game;

use super::PuzzleGenerator;

/// Extra field matched against a game's `Site` tag in games mode.
pub const GAME_FIELD: &str = "game";

/// Serves puzzles from a precomputed JSONL file.
///
/// - no input: every puzzle in the file
/// - a position: puzzles whose first fen is that position
/// - a game: puzzles whose `game` field equals the game's `Site` tag
#[derive(Debug)]
pub struct PrecomputedGenerator {
    path: PathBuf,
    cache: Mutex<Option<Arc<Vec<CandidatePuzzle>>>>,
}

impl PrecomputedGenerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn puzzles(&self) -> Result<Arc<Vec<CandidatePuzzle>>, GeneratorError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| GeneratorError::Failed("precomputed puzzle cache poisoned".to_string()))?;

        if let Some(puzzles) = cache.as_ref() {
            return Ok(Arc::clone(puzzles));
        }

        let puzzles = Arc::new(read_puzzles(&self.path)?);
        debug!(
            path = %self.path.display(),
            puzzles = puzzles.len(),
            "Loaded precomputed puzzles"
        );
        *cache = Some(Arc::clone(&puzzles));
        Ok(puzzles)
    }
}

impl PuzzleGenerator for PrecomputedGenerator {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn generate_from_position(&self, fen: &str) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        let fen = fen.trim();
        Ok(self
            .puzzles()?
            .iter()
            .filter(|p| p.start_fen().is_some_and(|start| start.trim() == fen))
            .cloned()
            .collect())
    }

    fn generate_from_game(&self, game: &Game) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        let Some(site) = game.header("Site") else {
            return Ok(Vec::new());
        };
        Ok(self
            .puzzles()?
            .iter()
            .filter(|p| {
                p.extra
                    .get(GAME_FIELD)
                    .and_then(|v| v.as_str())
                    .is_some_and(|g| g == site)
            })
            .cloned()
            .collect())
    }

    fn generate(&self) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        Ok(self.puzzles()?.as_ref().clone())
    }
}

/// Reads a JSONL file of candidate puzzles, skipping blank lines.
///
/// # Errors
///
/// Returns `GeneratorError::InvalidRecord` naming the first bad line.
pub fn read_puzzles(path: &Path) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
    let reader = BufReader::new(File::open(path)?);
    let mut puzzles = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let puzzle = serde_json::from_str(&line).map_err(|e| GeneratorError::InvalidRecord {
            line: index + 1,
            reason: e.to_string(),
        })?;
        puzzles.push(puzzle);
    }

    Ok(puzzles)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::source::games::parse_games;

    const FORK: &str = "4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1";

    fn write_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn fixture() -> tempfile::NamedTempFile {
        write_file(&[
            &format!(r#"{{"fens": ["{}"], "solutions": [["a1a8"]], "level": 1}}"#, FORK),
            "",
            r#"{"fens": ["8/8/8/8/8/8/8/K6k w - - 0 1"], "solutions": [], "level": "easy", "game": "https://lichess.org/xyz"}"#,
        ])
    }

    #[test]
    fn test_generate_all() {
        let file = fixture();
        let generator = PrecomputedGenerator::new(file.path());

        let puzzles = generator.generate().unwrap();
        assert_eq!(puzzles.len(), 2);
        assert_eq!(puzzles[0].fens[0], FORK);
    }

    #[test]
    fn test_generate_from_position_filters() {
        let file = fixture();
        let generator = PrecomputedGenerator::new(file.path());

        assert_eq!(generator.generate_from_position(FORK).unwrap().len(), 1);
        assert!(generator
            .generate_from_position("8/8/8/8/8/8/8/8 w - - 0 1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_generate_from_game_matches_site() {
        let file = fixture();
        let generator = PrecomputedGenerator::new(file.path());
        let games = parse_games(
            "[Site \"https://lichess.org/xyz\"]\n\n1. e4 *\n\n[Site \"elsewhere\"]\n\n1. d4 *\n",
        )
        .unwrap();

        assert_eq!(generator.generate_from_game(&games[0]).unwrap().len(), 1);
        assert!(generator.generate_from_game(&games[1]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_line() {
        let file = write_file(&[r#"{"fens": []}"#]);
        let generator = PrecomputedGenerator::new(file.path());

        let err = generator.generate().unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn test_missing_file() {
        let generator = PrecomputedGenerator::new("/nonexistent/puzzles.jsonl");
        assert!(matches!(generator.generate(), Err(GeneratorError::Io(_))));
    }
}
