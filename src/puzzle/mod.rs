//! Candidate puzzle records produced by generation strategies.
//!
//! A [`CandidatePuzzle`] is the uniform shape every source adapter hands to
//! the curation pipeline. Field names are `snake_case` here; the flattener
//! renames them when building rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single move sequence that solves a puzzle.
pub type Solution = Vec<String>;

/// Difficulty classification attached to a puzzle by its generator.
///
/// Generators label levels either numerically (`1`, `2`, ...) or by name
/// (`"easy"`). Both are kept as-is in the persisted rows; [`Level::key`] gives
/// the form used as a JSON object key in the grouped artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Number(i64),
    Name(String),
}

impl Level {
    /// Returns the grouping key for this level.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Number(n) => write!(f, "{}", n),
            Level::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<i64> for Level {
    fn from(n: i64) -> Self {
        Level::Number(n)
    }
}

impl From<&str> for Level {
    fn from(name: &str) -> Self {
        Level::Name(name.to_string())
    }
}

/// A generator-produced puzzle, prior to curation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePuzzle {
    /// Board positions in FEN; the first entry is the starting position.
    #[serde(default)]
    pub fens: Vec<String>,
    /// Acceptable solution move sequences.
    #[serde(default)]
    pub solutions: Vec<Solution>,
    /// Provenance label of the originating source or game.
    #[serde(default)]
    pub site: Option<String>,
    /// Ply within the originating game, when generated from a game.
    #[serde(default)]
    pub game_move_number: Option<u32>,
    /// Difficulty classification.
    pub level: Level,
    /// Generator-specific fields, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CandidatePuzzle {
    /// Creates an empty puzzle at the given level.
    pub fn new(level: Level) -> Self {
        Self {
            fens: Vec::new(),
            solutions: Vec::new(),
            site: None,
            game_move_number: None,
            level,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the position sequence.
    pub fn with_fens<I, S>(mut self, fens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fens = fens.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an acceptable solution.
    pub fn with_solution<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.solutions.push(moves.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the provenance label.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    /// Sets the originating ply within a game.
    pub fn with_game_move_number(mut self, ply: u32) -> Self {
        self.game_move_number = Some(ply);
        self
    }

    /// Adds a generator-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns true if the puzzle carries a non-empty provenance label.
    pub fn has_site(&self) -> bool {
        self.site.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns the starting position, if any.
    pub fn start_fen(&self) -> Option<&str> {
        self.fens.first().map(String::as_str)
    }
}
