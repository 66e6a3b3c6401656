//! End-to-end curation runs over real files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use puzzle_forge::export::{read_artifact, validate_artifact};
use puzzle_forge::generator::{GeneratorRegistry, GeneratorSpec, PuzzleGenerator};
use puzzle_forge::pipeline::{Manifest, ManifestPaths, Orchestrator, PuzzleTypeConfig, RunState};
use puzzle_forge::prune::PruneConfig;
use puzzle_forge::source::{Game, LoadMode};
use puzzle_forge::{CandidatePuzzle, GeneratorError, Level};
use tempfile::TempDir;

const ROOK_ENDGAME: &str = "4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1";
const MIDDLEGAME: &str = "r3k3/pp6/8/8/8/8/PP6/R3K3 w - - 0 1";
const BACK_RANK_MATE: &str = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";

const ONE_GAME: &str = r#"[Event "Casual"]
[Site "https://lichess.org/abc"]
[White "Alice"]
[Black "Bob"]
[Result "*"]

1. e4 e5 2. Nf3 Nc6 *
"#;

/// Turns every input into one single-solution puzzle and counts calls.
#[derive(Default)]
struct Echo {
    calls: AtomicUsize,
}

impl Echo {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PuzzleGenerator for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn generate_from_position(&self, _fen: &str) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![CandidatePuzzle::new(Level::Number(1)).with_solution(["a1a8"])])
    }

    fn generate_from_game(&self, game: &Game) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(fen) = game.fen_at(3) else {
            return Ok(Vec::new());
        };
        Ok(vec![CandidatePuzzle::new(Level::Number(2))
            .with_fens([fen])
            .with_solution(["Nf3"])
            .with_game_move_number(3)])
    }

    fn generate(&self) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            CandidatePuzzle::new(Level::Number(1))
                .with_fens([ROOK_ENDGAME])
                .with_solution(["a1a8"]),
            CandidatePuzzle::new(Level::Number(3))
                .with_fens([MIDDLEGAME])
                .with_solution(["a1a7"])
                .with_solution(["a2a4"]),
        ])
    }
}

/// Yields nothing for every input.
struct Silent;

impl PuzzleGenerator for Silent {
    fn name(&self) -> &str {
        "silent"
    }

    fn generate_from_game(&self, _game: &Game) -> Result<Vec<CandidatePuzzle>, GeneratorError> {
        Ok(Vec::new())
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn paths(&self) -> ManifestPaths {
        ManifestPaths {
            source_games_path: Some(self.dir.path().join("games.pgn")),
            source_positions_path: Some(self.dir.path().join("positions.jsonl")),
            puzzles_dir: self.dir.path().join("puzzles"),
            ..ManifestPaths::default()
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn named(load: LoadMode, name: &str) -> PuzzleTypeConfig {
    PuzzleTypeConfig::new(
        load,
        GeneratorSpec::Named {
            name: name.to_string(),
        },
    )
}

#[test]
fn test_duplicate_positions_are_dropped() {
    let fixture = Fixture::new();
    fixture.write(
        "positions.jsonl",
        &format!(
            "{{\"fen\": \"{0}\", \"site\": \"site-a\"}}\n{{\"fen\": \"{0}\", \"site\": \"site-b\"}}\n",
            ROOK_ENDGAME
        ),
    );
    let echo = Arc::new(Echo::default());
    let manifest = Manifest::new(fixture.paths())
        .with_puzzle("rooks", named(LoadMode::FromPositions, "echo"));
    let registry = GeneratorRegistry::new().with("echo", echo.clone());
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    let report = orchestrator.run("rooks", false).unwrap();

    assert_eq!(report.state, RunState::Written);
    assert_eq!(echo.calls(), 2);
    assert_eq!(report.candidates, Some(2));
    assert_eq!(report.duplicates_dropped, Some(1));

    let artifact = read_artifact(&report.output_path).unwrap();
    let rows = &artifact["1"];
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fens(), &[ROOK_ENDGAME.to_string()]);
    let site = rows[0].get("site").and_then(|v| v.as_str()).unwrap();
    assert!(site == "site-a" || site == "site-b");
}

#[test]
fn test_zero_solution_puzzle_is_pruned() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "candidates.jsonl",
        &format!(
            "{{\"fens\": [\"{0}\"], \"solutions\": [], \"level\": 1}}\n{{\"fens\": [\"{1}\"], \"solutions\": [[\"a1a7\"]], \"level\": 1}}\n",
            ROOK_ENDGAME, MIDDLEGAME
        ),
    );
    let manifest = Manifest::new(fixture.paths()).with_puzzle(
        "mixed",
        PuzzleTypeConfig::new(LoadMode::FromSelf, GeneratorSpec::Precomputed { path }),
    );
    let orchestrator = Orchestrator::new(manifest, &GeneratorRegistry::new()).unwrap();

    let report = orchestrator.run("mixed", false).unwrap();

    assert_eq!(report.state, RunState::Written);
    let prune = report.prune.unwrap();
    assert_eq!(prune.input, 2);
    assert_eq!(prune.after_thresholds, 1);

    let artifact = read_artifact(&report.output_path).unwrap();
    assert_eq!(artifact["1"].len(), 1);
    assert_eq!(artifact["1"][0].solution_count(), 1);
}

#[test]
fn test_passthrough_keeps_finished_and_unsolved_puzzles() {
    let fixture = Fixture::new();
    fixture.write(
        "candidates.jsonl",
        &format!(
            "{{\"fens\": [\"{0}\"], \"solutions\": [], \"level\": 1}}\n{{\"fens\": [\"{1}\"], \"solutions\": [[\"a1a7\"]], \"level\": 1}}\n",
            ROOK_ENDGAME, BACK_RANK_MATE
        ),
    );
    let manifest = Manifest::from_yaml_str(
        "paths:\n  puzzles_dir: out\npuzzles:\n  raw:\n    load: from_self\n    generator: { kind: precomputed, path: candidates.jsonl }\n    prune: { kind: passthrough }\n",
        fixture.root(),
    )
    .unwrap();
    manifest.validate().unwrap();
    let orchestrator = Orchestrator::new(manifest, &GeneratorRegistry::new()).unwrap();

    let report = orchestrator.run("raw", false).unwrap();

    assert_eq!(report.state, RunState::Written);
    assert_eq!(report.prune.unwrap().pruned(), 0);

    let artifact = read_artifact(&report.output_path).unwrap();
    let rows = &artifact["1"];
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|row| row.solution_count() == 0));
    assert!(rows.iter().any(|row| row.start_fen() == Some(BACK_RANK_MATE)));
}

#[test]
fn test_existing_output_is_left_alone() {
    let fixture = Fixture::new();
    let echo = Arc::new(Echo::default());
    let manifest =
        Manifest::new(fixture.paths()).with_puzzle("mates", named(LoadMode::FromSelf, "echo"));
    let registry = GeneratorRegistry::new().with("echo", echo.clone());
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    let output = orchestrator.manifest().output_path("mates");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    fs::write(&output, "sentinel").unwrap();

    let report = orchestrator.run("mates", false).unwrap();

    assert_eq!(report.state, RunState::SkippedExisting);
    assert_eq!(echo.calls(), 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "sentinel");
}

#[test]
fn test_game_without_puzzles_writes_nothing() {
    let fixture = Fixture::new();
    fixture.write("games.pgn", ONE_GAME);
    let manifest =
        Manifest::new(fixture.paths()).with_puzzle("quiet", named(LoadMode::FromGames, "silent"));
    let registry = GeneratorRegistry::new().with("silent", Arc::new(Silent));
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    let report = orchestrator.run("quiet", false).unwrap();

    assert_eq!(report.state, RunState::SkippedNoCandidates);
    assert!(!report.output_path.exists());
}

#[test]
fn test_games_fill_site_from_game() {
    let fixture = Fixture::new();
    fixture.write("games.pgn", ONE_GAME);
    let prune = PruneConfig::new()
        .with_piece_count(4, 32)
        .with_piece_per_solution(2.0, 32.0);
    let manifest = Manifest::new(fixture.paths())
        .with_puzzle("openings", named(LoadMode::FromGames, "echo").with_prune(prune));
    let registry = GeneratorRegistry::new().with("echo", Arc::new(Echo::default()));
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    let report = orchestrator.run("openings", false).unwrap();
    assert_eq!(report.state, RunState::Written);

    let artifact = read_artifact(&report.output_path).unwrap();
    let row = &artifact["2"][0];
    assert_eq!(
        row.get("site").and_then(|v| v.as_str()),
        Some("https://lichess.org/abc#3")
    );
    assert_eq!(row.get("gameMoveNumber").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(row.piece_count(), 32);
}

#[test]
fn test_illegal_game_fails_the_type() {
    let fixture = Fixture::new();
    fixture.write("games.pgn", "[Event \"Broken\"]\n\n1. e4 e4 *\n");
    let echo = Arc::new(Echo::default());
    let manifest =
        Manifest::new(fixture.paths()).with_puzzle("broken", named(LoadMode::FromGames, "echo"));
    let registry = GeneratorRegistry::new().with("echo", echo.clone());
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    assert!(orchestrator.run("broken", false).is_err());
    assert_eq!(echo.calls(), 0);
}

#[test]
fn test_written_artifact_round_trips() {
    let fixture = Fixture::new();
    let manifest =
        Manifest::new(fixture.paths()).with_puzzle("mixed", named(LoadMode::FromSelf, "echo"));
    let registry = GeneratorRegistry::new().with("echo", Arc::new(Echo::default()));
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    let report = orchestrator.run("mixed", false).unwrap();
    let written = report.written.unwrap();
    assert_eq!(written.rows, 2);

    let artifact = read_artifact(&report.output_path).unwrap();
    assert_eq!(artifact.len(), 2);
    assert_eq!(artifact["1"][0].start_fen(), Some(ROOK_ENDGAME));
    assert_eq!(artifact["1"][0].piece_count(), 4);
    assert_eq!(artifact["3"][0].start_fen(), Some(MIDDLEGAME));
    assert_eq!(artifact["3"][0].solution_count(), 2);
    assert_eq!(artifact["3"][0].level(), &Level::Number(3));

    let validation = validate_artifact(&report.output_path).unwrap();
    assert!(validation.is_valid(), "{:?}", validation.issues);
    assert_eq!(validation.rows, 2);
}

#[test]
fn test_batch_continues_after_failure() {
    let fixture = Fixture::new();
    fixture.write("positions.jsonl", "{\"fen\": \"x\"}\n");
    let manifest = Manifest::new(fixture.paths())
        .with_puzzle("broken", named(LoadMode::FromPositions, "echo"))
        .with_puzzle("mates", named(LoadMode::FromSelf, "echo"));
    let registry = GeneratorRegistry::new().with("echo", Arc::new(Echo::default()));
    let orchestrator = Orchestrator::new(manifest, &registry).unwrap();

    let summary = orchestrator.run_batch(&orchestrator.names(), false);

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.outcomes[0].puzzle, "broken");
    assert!(summary.outcomes[0].is_failure());
    assert_eq!(summary.outcomes[1].puzzle, "mates");
    assert_eq!(summary.outcomes[1].status, "written");
    assert_eq!(summary.failed(), 1);
}

#[test]
fn test_manifest_file_with_precomputed_generator() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.root().join("data")).unwrap();
    fixture.write(
        "data/forks.jsonl",
        &format!(
            "{{\"fens\": [\"{}\"], \"solutions\": [[\"a1a8\"]], \"level\": \"easy\", \"theme\": \"back_rank\"}}\n",
            ROOK_ENDGAME
        ),
    );
    let manifest_path = fixture.write(
        "puzzles.yaml",
        "paths:\n  puzzles_dir: out\npuzzles:\n  forks:\n    load: from_self\n    generator: { kind: precomputed, path: data/forks.jsonl }\n    prune: { seed: 11 }\n",
    );

    let manifest = Manifest::load(&manifest_path).unwrap();
    let orchestrator = Orchestrator::new(manifest, &GeneratorRegistry::new()).unwrap();
    let report = orchestrator.run("forks", false).unwrap();

    assert_eq!(report.state, RunState::Written);
    assert_eq!(report.output_path, fixture.root().join("out").join("forks.json"));

    let artifact = read_artifact(&report.output_path).unwrap();
    let row = &artifact["easy"][0];
    assert_eq!(row.get("theme").and_then(|v| v.as_str()), Some("back_rank"));
    assert_eq!(row.level(), &Level::from("easy"));
}
