//! Command-line interface for docweaver.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::{DocweaverConfig, DEFAULT_CONFIG_NAME};
use crate::model::ProjectAnalysis;
use crate::runner::{scan_project, DocGenerator};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// LLM-assisted documentation generator for Java and Python codebases.
///
/// Docweaver inventories the declared types, functions and fields of a
/// project and turns them into narrative documentation through an LLM
/// backend, or through a deterministic mock layer for offline runs.
#[derive(Parser)]
#[command(name = "docweaver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a project and print its element inventory
    #[command(visible_alias = "scan")]
    Analyze(AnalyzeArgs),
    /// Scan a project and generate documentation artifacts
    #[command(visible_alias = "gen")]
    Generate(GenerateArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Project root to scan
    pub path: PathBuf,

    /// Path to config JSON (default: docweaver.json if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Include private elements regardless of the configured default
    #[arg(long)]
    pub include_private: bool,

    /// List every discovered element, not just the summary
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the generate command.
#[derive(Parser)]
pub struct GenerateArgs {
    /// Project root to scan
    pub path: PathBuf,

    /// Path to config JSON (default: docweaver.json if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Include private elements regardless of the configured default
    #[arg(long)]
    pub include_private: bool,

    /// Output directory (overrides the configured one)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Use the offline mock provider layer instead of HTTP calls
    #[arg(long)]
    pub mock: bool,
}

/// Load the referenced config, the default file, or built-in defaults.
fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<DocweaverConfig> {
    match explicit {
        Some(path) => DocweaverConfig::load(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_NAME);
            if default.exists() {
                DocweaverConfig::load(&default)
            } else {
                Ok(DocweaverConfig::default_config())
            }
        }
    }
}

fn include_private_override(flag: bool) -> Option<bool> {
    if flag {
        Some(true)
    } else {
        None
    }
}

pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let config = load_config(args.config.as_ref())?;
    let analysis = scan_project(
        &args.path,
        &config,
        include_private_override(args.include_private),
    )?;

    print_summary(&analysis);

    if args.verbose {
        for element in &analysis.elements {
            println!("  {}", element.display_name());
        }
    }

    Ok(EXIT_SUCCESS)
}

pub fn run_generate(args: &GenerateArgs) -> anyhow::Result<i32> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(output) = &args.output {
        config.output.output_directory = output.clone();
    }

    let analysis = scan_project(
        &args.path,
        &config,
        include_private_override(args.include_private),
    )?;
    print_summary(&analysis);

    let generator = DocGenerator::new(&config, args.mock);
    let summary = generator.generate(&analysis)?;

    println!(
        "{} {} artifact(s) written, {} skipped, {} element(s) documented",
        "done:".green().bold(),
        summary.files_written,
        summary.files_skipped,
        summary.elements_documented
    );

    Ok(EXIT_SUCCESS)
}

fn print_summary(analysis: &ProjectAnalysis) {
    let stats = analysis.stats();
    println!(
        "{} {} elements in {} files ({} types, {} functions, {} fields)",
        "found:".cyan().bold(),
        stats.total_elements,
        stats.file_count,
        stats.type_count,
        stats.function_count,
        stats.field_count
    );
}
