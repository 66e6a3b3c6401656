//! CLI command definitions for puzzle-forge.
//!
//! Three commands: `run` curates puzzle types from a manifest, `validate`
//! checks artifacts already on disk, and `list` shows what a manifest defines.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::export::{validate_artifact, ValidationReport, MAX_REPORTED_ISSUES};
use crate::generator::{GeneratorRegistry, GeneratorSpec};
use crate::pipeline::{BatchSummary, Manifest, Orchestrator};

/// Default manifest location.
const DEFAULT_MANIFEST: &str = "puzzles.yaml";

/// Offline curation of chess puzzle sets.
#[derive(Parser)]
#[command(name = "puzzle-forge")]
#[command(about = "Curate candidate chess puzzles into difficulty-grouped puzzle sets")]
#[command(version)]
#[command(
    long_about = "puzzle-forge turns generated candidate puzzles into a pruned, deduplicated,\nlevel-grouped JSON artifact per puzzle type.\n\nExample usage:\n  puzzle-forge run knight-forks --manifest puzzles.yaml\n  puzzle-forge run --all --overwrite-assets"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the curation pipeline for one or more puzzle types.
    Run(RunArgs),

    /// Check persisted puzzle artifacts against the expected schema.
    Validate(ValidateArgs),

    /// List the puzzle types a manifest defines.
    #[command(alias = "ls")]
    List(ListArgs),
}

/// Arguments for `puzzle-forge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Puzzle types to build.
    #[arg(value_name = "PUZZLE", required_unless_present = "all")]
    pub puzzles: Vec<String>,

    /// Manifest file.
    #[arg(short, long, env = "PUZZLE_FORGE_MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Regenerate artifacts that already exist.
    #[arg(long)]
    pub overwrite_assets: bool,

    /// Build every puzzle type in the manifest.
    #[arg(long, conflicts_with = "puzzles")]
    pub all: bool,

    /// Print the outcome summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `puzzle-forge validate`.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// A single artifact to check. Defaults to every `*.json` in the manifest's puzzles_dir.
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Manifest file, used when no --path is given.
    #[arg(short, long, env = "PUZZLE_FORGE_MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Print the reports as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `puzzle-forge list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Manifest file.
    #[arg(short, long, env = "PUZZLE_FORGE_MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Print the puzzle types as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments and only the built-in generators.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    run_with_registry(cli, &GeneratorRegistry::new())
}

/// Run the CLI with generators supplied by the embedding program.
///
/// Manifest entries of `kind: named` resolve against `registry`.
pub fn run_with_registry(cli: Cli, registry: &GeneratorRegistry) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_run_command(args, registry),
        Commands::Validate(args) => run_validate_command(args),
        Commands::List(args) => run_list_command(args),
    }
}

// ============================================================================
// Run
// ============================================================================

fn run_run_command(args: RunArgs, registry: &GeneratorRegistry) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest)?;
    let orchestrator =
        Orchestrator::new(manifest, registry).context("Failed to initialize pipeline")?;

    let puzzles = if args.all {
        orchestrator.names()
    } else {
        args.puzzles
    };
    if puzzles.is_empty() {
        anyhow::bail!("No puzzle types to run");
    }

    info!(count = puzzles.len(), overwrite = args.overwrite_assets, "Starting batch");
    let summary = orchestrator.run_batch(&puzzles, args.overwrite_assets);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_batch_summary(&summary);
    }

    if summary.has_failures() {
        anyhow::bail!(
            "{} of {} puzzle types failed",
            summary.failed(),
            summary.outcomes.len()
        );
    }
    Ok(())
}

fn print_batch_summary(summary: &BatchSummary) {
    println!("\n=== Puzzle Curation Results ===");
    for outcome in &summary.outcomes {
        match (&outcome.report, &outcome.error) {
            (Some(report), _) => {
                let rows = report.written.as_ref().map_or(0, |w| w.rows);
                println!(
                    "  {:<24} {:<26} {:>6} puzzles  ({} ms)",
                    outcome.puzzle, outcome.status, rows, report.elapsed_ms
                );
            }
            (None, Some(err)) => {
                println!("  {:<24} {:<26}", outcome.puzzle, outcome.status);
                println!("    error: {}", err);
            }
            (None, None) => println!("  {:<24} {}", outcome.puzzle, outcome.status),
        }
    }
    println!(
        "\nWritten: {}  Failed: {}  Total: {}",
        summary.written(),
        summary.failed(),
        summary.outcomes.len()
    );
}

// ============================================================================
// Validate
// ============================================================================

fn run_validate_command(args: ValidateArgs) -> anyhow::Result<()> {
    let files = match &args.path {
        Some(path) => vec![path.clone()],
        None => {
            let manifest = load_manifest(&args.manifest)?;
            artifact_files(&manifest.paths.puzzles_dir)?
        }
    };

    if files.is_empty() {
        if args.json {
            println!("[]");
        } else {
            println!("No artifacts found.");
        }
        return Ok(());
    }

    let reports = files
        .iter()
        .map(|path| {
            validate_artifact(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<ValidationReport>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_validation_report(report);
        }
    }

    let invalid = reports.iter().filter(|r| !r.is_valid()).count();
    if invalid > 0 {
        anyhow::bail!("{} of {} artifacts are invalid", invalid, reports.len());
    }
    Ok(())
}

fn print_validation_report(report: &ValidationReport) {
    if report.is_valid() {
        println!(
            "✓ {} ({} levels, {} puzzles)",
            report.path.display(),
            report.groups,
            report.rows
        );
        return;
    }

    println!("✗ {} ({} issues)", report.path.display(), report.issues.len());
    for issue in report.issues.iter().take(MAX_REPORTED_ISSUES) {
        println!("    {}", issue);
    }
    if report.issues.len() > MAX_REPORTED_ISSUES {
        println!("    And more!");
    }
}

/// Every `*.json` file directly inside `dir`, sorted.
fn artifact_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Serialize)]
struct ListedPuzzle {
    name: String,
    load: String,
    generator: String,
    prune: String,
    output: PathBuf,
    exists: bool,
}

fn run_list_command(args: ListArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&args.manifest)?;

    let listed: Vec<ListedPuzzle> = manifest
        .puzzles
        .iter()
        .map(|(name, config)| {
            let output = manifest.output_path(name);
            ListedPuzzle {
                name: name.clone(),
                load: config.load.to_string(),
                generator: describe_generator(&config.generator),
                prune: config.prune.kind.to_string(),
                exists: output.exists(),
                output,
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if listed.is_empty() {
        println!("No puzzle types defined in {}", args.manifest.display());
        return Ok(());
    }

    for puzzle in &listed {
        println!(
            "{} {:<24} {:<16} {:<40} {:<12} {}",
            if puzzle.exists { "●" } else { "○" },
            puzzle.name,
            puzzle.load,
            puzzle.generator,
            puzzle.prune,
            puzzle.output.display()
        );
    }
    Ok(())
}

fn describe_generator(spec: &GeneratorSpec) -> String {
    match spec {
        GeneratorSpec::Precomputed { path } => format!("precomputed:{}", path.display()),
        GeneratorSpec::Named { name } => format!("named:{}", name),
    }
}

fn load_manifest(path: &Path) -> anyhow::Result<Manifest> {
    Manifest::load(path).with_context(|| format!("Failed to load manifest {}", path.display()))
}
