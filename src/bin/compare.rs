//! Build Compare CLI
//!
//! Extracts builds from decoded record trees and compares them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use build_compare::config::OutputFormat;
use build_compare::{
    BuildExtractor, CompareConfig, ComparisonEngine, ComparisonReport, PathFinder, Priority,
    RecordNode, StandardizedCharacter,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Exit code when the comparison found critical differences
const EXIT_CRITICAL: i32 = 2;

#[derive(Parser)]
#[command(name = "build-compare")]
#[command(about = "Normalize character builds and compare them by priority")]
struct Cli {
    /// Config file (defaults to build-compare.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Gem table JSON (overrides config)
    #[arg(long, global = true)]
    gems: Option<PathBuf>,

    /// Passive tree JSON (overrides config)
    #[arg(long, global = true)]
    tree: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the standardized character and extraction diagnostics
    Extract {
        /// Decoded build record tree (JSON)
        build: PathBuf,
    },

    /// Compare a player build against a target build
    Compare {
        /// Player build record tree (JSON)
        player: PathBuf,
        /// Target build record tree (JSON)
        target: PathBuf,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Shortest path from a build's allocation to a passive node
    Path {
        /// Decoded build record tree (JSON)
        build: PathBuf,
        /// Node ID or name
        node: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = CompareConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.gems.is_some() {
        config.reference.gem_table = cli.gems;
    }
    if cli.tree.is_some() {
        config.reference.skill_tree = cli.tree;
    }
    let reference = config.load_reference_data();

    match cli.command {
        Commands::Extract { build } => {
            let root = read_record(&build)?;
            let (character, diagnostics) = BuildExtractor::new(&reference)
                .extract_with_diagnostics(&root)
                .with_context(|| format!("extracting {}", build.display()))?;

            println!("{}", to_json(&character, config.output.format)?);
            if !diagnostics.is_empty() {
                eprintln!("{}", diagnostics.format_all());
            }
            Ok(0)
        }

        Commands::Compare { player, target, format } => {
            let extractor = BuildExtractor::new(&reference);
            let player_build = load_character(&extractor, &player)?;
            let target_build = load_character(&extractor, &target)?;

            let report = ComparisonEngine::new(&reference, config.engine.clone())
                .compare(&player_build, &target_build)
                .context("comparing builds")?;

            match format {
                ReportFormat::Json => println!("{}", to_json(&report, config.output.format)?),
                ReportFormat::Text => print_report(&report),
            }

            Ok(if report.has_critical() { EXIT_CRITICAL } else { 0 })
        }

        Commands::Path { build, node } => {
            let Some(graph) = reference.skill_graph.as_ref() else {
                bail!("no passive tree loaded; pass --tree or set reference.skill_tree");
            };
            let Some(node_id) = graph.resolve(&node) else {
                bail!("no passive node matches '{}'", node);
            };

            let character = load_character(&BuildExtractor::new(&reference), &build)?;
            let allocated = character.passive_allocation.allocated_set();
            let result = PathFinder::new(graph).find_shortest_path(&allocated, node_id);

            let name = graph.node_name(node_id);
            if result.already_allocated {
                println!("{} ({}) is already allocated", name, node_id);
            } else if !result.found {
                println!("{} ({}) is not reachable from the allocation", name, node_id);
                return Ok(1);
            } else {
                println!("Path to {} ({}): {} points", name, node_id, result.cost);
                for detail in &result.node_details {
                    println!("  {:>6}  {:<32} {}", detail.id, detail.name, detail.node_type);
                }
                println!(
                    "Efficiency {:.1}, {} detour node(s)",
                    result.efficiency,
                    result.detour_nodes.len()
                );
            }
            Ok(0)
        }
    }
}

fn read_record(path: &Path) -> anyhow::Result<RecordNode> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    RecordNode::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_character(extractor: &BuildExtractor<'_>, path: &Path) -> anyhow::Result<StandardizedCharacter> {
    let root = read_record(path)?;
    let (character, diagnostics) = extractor
        .extract_with_diagnostics(&root)
        .with_context(|| format!("extracting {}", path.display()))?;
    if diagnostics.warning_count() > 0 {
        eprintln!("{}: {} warning(s)", path.display(), diagnostics.warning_count());
    }
    Ok(character)
}

fn to_json<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Compact => serde_json::to_string(value)?,
    })
}

fn print_report(report: &ComparisonReport) {
    let summary = &report.summary;
    println!(
        "{} differences: {} critical, {} high, {} medium, {} low",
        summary.total, summary.critical, summary.high, summary.medium, summary.low
    );

    for priority in [Priority::Critical, Priority::High, Priority::Medium, Priority::Low] {
        let items: Vec<_> = report.by_priority(priority).collect();
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{}:", priority.as_str().to_uppercase());
        for diff in items {
            println!("  {}", diff);
        }
    }

    let slots: Vec<_> = report
        .gem_differences_by_slot
        .iter()
        .filter(|s| s.has_differences)
        .collect();
    if !slots.is_empty() {
        println!();
        println!("Gems by slot:");
        for slot in slots {
            println!("  {}", slot.slot);
            if !slot.missing_gems.is_empty() {
                println!("    missing: {}", slot.missing_gems.join(", "));
            }
            if !slot.extra_gems.is_empty() {
                println!("    extra:   {}", slot.extra_gems.join(", "));
            }
            for level in &slot.level_differences {
                println!(
                    "    {}: level {} -> {}, quality {} -> {}",
                    level.name, level.player_level, level.target_level, level.player_quality, level.target_quality
                );
            }
        }
    }
}
