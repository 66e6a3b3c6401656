//! Manifest configuration for the curation pipeline.
//!
//! The manifest is a YAML file naming the shared input and output paths and,
//! per puzzle type, how candidates are loaded, which generator produces them
//! and how they are pruned:
//!
//! ```yaml
//! paths:
//!   source_games_path: data/games.pgn
//!   source_positions_path: data/positions.jsonl
//!   puzzles_dir: assets/puzzles
//! puzzles:
//!   knight-forks:
//!     load: from_positions
//!     generator: { kind: precomputed, path: data/knight-forks.jsonl }
//!     prune: { max_piece_count: 16, seed: 7 }
//!   raw-forks:
//!     load: from_positions
//!     generator: { kind: precomputed, path: data/knight-forks.jsonl }
//!     prune: { kind: passthrough }
//! ```
//!
//! Relative paths are resolved against the manifest's own directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::GeneratorSpec;
use crate::prune::PruneConfig;
use crate::source::{LoadMode, DEFAULT_CHUNK_SIZE};

/// Overrides `paths.puzzles_dir`.
pub const ENV_PUZZLES_DIR: &str = "PUZZLE_FORGE_PUZZLES_DIR";
/// Seed applied to every puzzle type that has none.
pub const ENV_SEED: &str = "PUZZLE_FORGE_SEED";
/// Sample size applied to every puzzle type.
pub const ENV_SAMPLE_SIZE: &str = "PUZZLE_FORGE_SAMPLE_SIZE";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// A puzzle type was requested that the manifest does not define.
    #[error("Unknown puzzle type '{0}'")]
    UnknownPuzzle(String),

    /// The manifest is not valid YAML or does not match the schema.
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_puzzles_dir() -> PathBuf {
    PathBuf::from("puzzles")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Input and output locations shared by every puzzle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestPaths {
    /// PGN file for `from_games` types.
    #[serde(default)]
    pub source_games_path: Option<PathBuf>,
    /// JSONL positions file for `from_positions` types.
    #[serde(default)]
    pub source_positions_path: Option<PathBuf>,
    /// Directory receiving `<puzzle>.json` artifacts.
    #[serde(default = "default_puzzles_dir")]
    pub puzzles_dir: PathBuf,
    /// Records per chunk when reading positions.
    #[serde(default = "default_chunk_size")]
    pub positions_chunk_size: usize,
}

impl Default for ManifestPaths {
    fn default() -> Self {
        Self {
            source_games_path: None,
            source_positions_path: None,
            puzzles_dir: default_puzzles_dir(),
            positions_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Everything needed to build one puzzle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleTypeConfig {
    pub load: LoadMode,
    pub generator: GeneratorSpec,
    #[serde(default)]
    pub prune: PruneConfig,
}

impl PuzzleTypeConfig {
    pub fn new(load: LoadMode, generator: GeneratorSpec) -> Self {
        Self {
            load,
            generator,
            prune: PruneConfig::default(),
        }
    }

    pub fn with_prune(mut self, prune: PruneConfig) -> Self {
        self.prune = prune;
        self
    }
}

/// Parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub paths: ManifestPaths,
    /// Puzzle types by name, iterated in name order.
    #[serde(default)]
    pub puzzles: BTreeMap<String, PuzzleTypeConfig>,
}

impl Manifest {
    pub fn new(paths: ManifestPaths) -> Self {
        Self {
            paths,
            puzzles: BTreeMap::new(),
        }
    }

    /// Builder-style insertion of a puzzle type.
    pub fn with_puzzle(mut self, name: impl Into<String>, config: PuzzleTypeConfig) -> Self {
        self.puzzles.insert(name.into(), config);
        self
    }

    /// Loads a manifest file, applies environment overrides and validates it.
    ///
    /// # Environment Variables
    ///
    /// - `PUZZLE_FORGE_PUZZLES_DIR`: output directory
    /// - `PUZZLE_FORGE_SEED`: sampling seed for types without one
    /// - `PUZZLE_FORGE_SAMPLE_SIZE`: sample size for every type
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, an override
    /// is malformed, or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut manifest = Self::from_yaml_str(&text, base_dir)?;
        manifest.apply_env()?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parses manifest YAML, resolving relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the YAML does not match the schema.
    pub fn from_yaml_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut manifest: Manifest = serde_yaml::from_str(text)?;
        manifest.resolve_paths(base_dir);
        Ok(manifest)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };

        if let Some(path) = self.paths.source_games_path.as_mut() {
            resolve(path);
        }
        if let Some(path) = self.paths.source_positions_path.as_mut() {
            resolve(path);
        }
        resolve(&mut self.paths.puzzles_dir);

        for config in self.puzzles.values_mut() {
            if let GeneratorSpec::Precomputed { path } = &mut config.generator {
                resolve(path);
            }
        }
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unparseable override.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unparseable override.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_PUZZLES_DIR) {
            self.paths.puzzles_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup(ENV_SEED) {
            let seed: u64 = parse_env_value(&val, ENV_SEED)?;
            for config in self.puzzles.values_mut() {
                config.prune.seed.get_or_insert(seed);
            }
        }

        if let Some(val) = lookup(ENV_SAMPLE_SIZE) {
            let sample_size: usize = parse_env_value(&val, ENV_SAMPLE_SIZE)?;
            for config in self.puzzles.values_mut() {
                config.prune.sample_size = sample_size;
            }
        }

        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.positions_chunk_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "positions_chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.paths.puzzles_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "puzzles_dir cannot be empty".to_string(),
            ));
        }

        for (name, config) in &self.puzzles {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "puzzle type names cannot be empty".to_string(),
                ));
            }

            config
                .prune
                .validate()
                .map_err(|e| ConfigError::ValidationFailed(format!("{}: {}", name, e)))?;

            match config.load {
                LoadMode::FromPositions if self.paths.source_positions_path.is_none() => {
                    return Err(ConfigError::ValidationFailed(format!(
                        "{}: from_positions requires paths.source_positions_path",
                        name
                    )));
                }
                LoadMode::FromGames if self.paths.source_games_path.is_none() => {
                    return Err(ConfigError::ValidationFailed(format!(
                        "{}: from_games requires paths.source_games_path",
                        name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Looks up a puzzle type.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownPuzzle` if the manifest does not define it.
    pub fn puzzle(&self, name: &str) -> Result<&PuzzleTypeConfig, ConfigError> {
        self.puzzles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPuzzle(name.to_string()))
    }

    /// Names of every configured puzzle type, in order.
    pub fn names(&self) -> Vec<String> {
        self.puzzles.keys().cloned().collect()
    }

    /// Artifact path for a puzzle type.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.paths.puzzles_dir.join(format!("{}.json", name))
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
