//! CodeUnify command-line tool.
//!
//! Provides subcommands for unifying edit proposals into a single text
//! artifact, previewing detected conflicts and their resolutions, and
//! generating / validating configuration files.

mod style;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use codeunify_core::config::AppConfig;
use codeunify_core::conflict::{ConflictDetector, ConflictResolver, Strategy};
use codeunify_core::edit::Edit;
use codeunify_core::ingest;
use codeunify_core::unifier::Unifier;
use codeunify_core::UnificationResult;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// CodeUnify command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "codeunify",
    version,
    about = "Unify competing edit proposals from multiple AI models"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./codeunify.toml")]
    config: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Unify proposal files against an original artifact.
    Unify {
        /// Path to the original artifact.
        original: PathBuf,

        /// Paths to proposal JSON files.
        #[arg(required = true)]
        proposals: Vec<PathBuf>,

        /// Merge strategy: conservative, aggressive, smart, or manual.
        #[arg(short, long)]
        strategy: Option<String>,

        /// Output path (default: the original path plus the configured suffix).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Artifact path to unify, when proposals span several files.
        #[arg(long)]
        artifact: Option<String>,

        /// Print a diff between the original and the unified text.
        #[arg(long)]
        diff: bool,

        /// Print the full unification result as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Detect conflicts and preview resolutions without applying anything.
    Conflicts {
        /// Paths to proposal JSON files.
        #[arg(required = true)]
        proposals: Vec<PathBuf>,

        /// Merge strategy: conservative, aggressive, smart, or manual.
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./codeunify.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .without_time()
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { output } => {
            cmd_init(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            cmd_validate(&cli.config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Conflicts {
            proposals,
            strategy,
        } => {
            let config = AppConfig::load_or_default(&cli.config)?;
            cmd_conflicts(&config, &proposals, strategy.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Unify {
            original,
            proposals,
            strategy,
            output,
            artifact,
            diff,
            json,
        } => {
            let config = AppConfig::load_or_default(&cli.config)?;
            cmd_unify(
                &config,
                &original,
                &proposals,
                strategy.as_deref(),
                output,
                artifact,
                diff,
                json,
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The strategy from the flag, falling back to the configured default.
fn resolve_strategy(flag: Option<&str>, config: &AppConfig) -> Result<Strategy> {
    match flag {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.unify.strategy),
    }
}

/// Load every proposal source; file-level failures become warnings so the
/// remaining sources are still processed.
fn load_edit_sets(proposals: &[PathBuf]) -> (Vec<Vec<Edit>>, Vec<String>) {
    let mut sets = Vec::new();
    let mut warnings = Vec::new();
    for path in proposals {
        match ingest::load_proposals(path) {
            Ok(batch) => {
                warnings.extend(batch.warnings);
                sets.push(batch.edits);
            }
            Err(e) => warnings.push(e.to_string()),
        }
    }
    debug!(
        sources = sets.len(),
        failed = proposals.len() - sets.len(),
        "loaded proposal sources"
    );
    (sets, warnings)
}

/// The artifact path the proposals target: the single distinct `file_path`
/// among the loaded edits, or the original path when they disagree.
fn infer_artifact(sets: &[Vec<Edit>], original: &std::path::Path) -> String {
    let mut paths: Vec<&str> = Vec::new();
    for edit in sets.iter().flatten() {
        if !paths.contains(&edit.artifact_path.as_str()) {
            paths.push(&edit.artifact_path);
        }
    }
    match paths.as_slice() {
        [only] => (*only).to_string(),
        _ => original.display().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn cmd_unify(
    config: &AppConfig,
    original: &PathBuf,
    proposals: &[PathBuf],
    strategy_flag: Option<&str>,
    output: Option<PathBuf>,
    artifact: Option<String>,
    diff: bool,
    json: bool,
) -> Result<ExitCode> {
    let strategy = resolve_strategy(strategy_flag, config)?;
    let original_text = fs::read_to_string(original)
        .with_context(|| format!("failed to read original file '{}'", original.display()))?;

    let (sets, upstream_warnings) = load_edit_sets(proposals);
    let artifact = artifact.unwrap_or_else(|| infer_artifact(&sets, original));

    let unifier = Unifier::new(strategy).with_validator(config.validation.validator());
    let result =
        unifier.unify_with_warnings(&original_text, &artifact, &sets, upstream_warnings);

    let output_path = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}{}", original.display(), config.output.suffix))
    });
    fs::write(&output_path, &result.unified_text)
        .with_context(|| format!("failed to write unified file '{}'", output_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, &output_path);
        if diff {
            println!();
            println!("{}", style::header("Diff:"));
            print!("{}", diffy::create_patch(&original_text, &result.unified_text));
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(result: &UnificationResult, output_path: &std::path::Path) {
    println!();
    if result.success {
        println!(
            "{}",
            style::success(&format!(
                "Unified text written to {}",
                output_path.display()
            ))
        );
    } else {
        println!(
            "{}",
            style::warn(&format!(
                "Unified text written to {} with warnings",
                output_path.display()
            ))
        );
    }

    println!();
    println!("{}", style::header("Summary:"));
    println!("  Applied edits:   {}", result.applied_edits.len());
    println!("  Conflicts found: {}", result.conflicts.len());
    println!("  Warnings:        {}", result.warnings.len());

    if !result.conflicts.is_empty() {
        println!();
        println!("{}", style::header("Conflicts:"));
        for conflict in &result.conflicts {
            println!("  - {}", conflict.description);
            if let Some(resolution) = &conflict.resolution {
                println!("    {}", style::dim(&resolution.rationale));
            }
        }
    }

    if !result.warnings.is_empty() {
        println!();
        for warning in &result.warnings {
            println!("{}", style::warn(warning));
        }
    }
}

fn cmd_conflicts(
    config: &AppConfig,
    proposals: &[PathBuf],
    strategy_flag: Option<&str>,
) -> Result<()> {
    let strategy = resolve_strategy(strategy_flag, config)?;
    let (sets, warnings) = load_edit_sets(proposals);
    let edits: Vec<Edit> = sets.into_iter().flatten().collect();

    for warning in &warnings {
        println!("{}", style::warn(warning));
    }

    let conflicts = ConflictDetector::detect(&edits);
    if conflicts.is_empty() {
        println!();
        println!("{}", style::success("No conflicts detected"));
        println!();
        return Ok(());
    }

    let resolved = ConflictResolver::resolve(conflicts, strategy);

    println!();
    println!(
        "{}",
        style::header(&format!(
            "Conflicts ({}) under '{}' strategy",
            resolved.len(),
            strategy
        ))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "File", "Kind", "Contributors", "Resolution"]);

    for conflict in &resolved {
        let id_short = if conflict.id.len() > 8 {
            &conflict.id[..8]
        } else {
            &conflict.id
        };
        let contributors = conflict
            .edits
            .iter()
            .map(|e| e.contributor_id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let rationale = conflict
            .resolution
            .as_ref()
            .map(|r| r.rationale.as_str())
            .unwrap_or("—");

        table.add_row(vec![
            Cell::new(id_short),
            Cell::new(&conflict.artifact_path),
            Cell::new(conflict.kind),
            Cell::new(contributors),
            Cell::new(rationale),
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}

fn cmd_init(output: &PathBuf) -> Result<()> {
    if output.exists() {
        bail!(
            "config file '{}' already exists; remove it or choose another path",
            output.display()
        );
    }
    fs::write(output, AppConfig::default_template())
        .with_context(|| format!("failed to write config file '{}'", output.display()))?;
    println!(
        "{}",
        style::success(&format!("Wrote default config to {}", output.display()))
    );
    Ok(())
}

fn cmd_validate(path: &PathBuf) -> Result<()> {
    let config = AppConfig::load_from_file(path)
        .with_context(|| format!("configuration file '{}' is invalid", path.display()))?;
    println!(
        "{}",
        style::success(&format!(
            "Configuration is valid (strategy: {}, validation: {:?})",
            config.unify.strategy, config.validation.mode
        ))
    );
    Ok(())
}
