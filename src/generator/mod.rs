//! Puzzle generation strategies.
//!
//! Generation itself lives outside this crate. A strategy plugs into the
//! pipeline by implementing [`PuzzleGenerator`] for whichever input modes it
//! understands; the remaining modes report `GeneratorError::UnsupportedInput`.
//!
//! Puzzle types name their strategy in the manifest with a [`GeneratorSpec`],
//! resolved once at startup through a [`GeneratorRegistry`].

pub mod precomputed;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;
use crate::puzzle::CandidatePuzzle;
use crate::source::Game;

pub use precomputed::PrecomputedGenerator;

/// A strategy that turns an input unit into zero or more candidate puzzles.
pub trait PuzzleGenerator: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Generates puzzles starting from a single position.
    fn generate_from_position(&self, fen: &str) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        let _ = fen;
        Err(self.unsupported("position"))
    }

    /// Generates puzzles from a replayed game.
    fn generate_from_game(&self, game: &Game) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        let _ = game;
        Err(self.unsupported("game"))
    }

    /// Generates puzzles with no input.
    fn generate(&self) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        Err(self.unsupported("empty"))
    }

    #[doc(hidden)]
    fn unsupported(&self, input: &str) -> GeneratorError {
        GeneratorError::UnsupportedInput {
            generator: self.name().to_string(),
            input: input.to_string(),
        }
    }
}

/// How a puzzle type names its generation strategy in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSpec {
    /// Replay puzzles produced ahead of time into a JSONL file.
    Precomputed { path: PathBuf },
    /// A strategy registered by the embedding program.
    Named { name: String },
}

/// Strategies available to the manifest by name.
#[derive(Default, Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn PuzzleGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy under a name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, generator: Arc<dyn PuzzleGenerator>) {
        self.generators.insert(name.into(), generator);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, generator: Arc<dyn PuzzleGenerator>) -> Self {
        self.register(name, generator);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PuzzleGenerator>> {
        self.generators.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a manifest generator entry into a strategy.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Unregistered` for an unknown named strategy.
    pub fn resolve(&self, spec: &GeneratorSpec) -> Result<Arc<dyn PuzzleGenerator>, GeneratorError> {
        match spec {
            GeneratorSpec::Precomputed { path } => Ok(Arc::new(PrecomputedGenerator::new(path))),
            GeneratorSpec::Named { name } => self
                .get(name)
                .ok_or_else(|| GeneratorError::Unregistered(name.clone())),
        }
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.names())
            .finish()
    }
}
