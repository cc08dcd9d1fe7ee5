//! PPTX Concatenator CLI tool
//!
//! A command-line tool for appending the slides of PowerPoint presentations
//! to a source presentation.

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use pptx_concat::{concat, concat_multiple};

/// Concatenate PowerPoint presentations
#[derive(Parser)]
#[command(name = "pptx-concat")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Concatenate two presentations
    pptx-concat source.pptx target.pptx -o output.pptx

    # Concatenate multiple presentations
    pptx-concat source.pptx file1.pptx file2.pptx file3.pptx -o output.pptx

    # Append every numbered deck in order
    pptx-concat intro.pptx \"[0-9]*.pptx\" -o course.pptx")]
struct Cli {
    /// Source PPTX file (base presentation)
    source: PathBuf,

    /// Target PPTX file(s) to append. Supports glob patterns like "*.pptx"
    #[arg(required = true)]
    targets: Vec<String>,

    /// Output PPTX file path
    #[arg(short, long)]
    output: PathBuf,

    /// Log progress to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber at the level chosen by `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Validate input files
    if !cli.source.exists() {
        bail!("Source file '{}' not found", cli.source.display());
    }
    let targets = expand_globs(cli.targets)?;
    for target in &targets {
        if !target.exists() {
            bail!("Target file '{}' not found", target.display());
        }
    }

    // Perform concatenation
    if let [target] = targets.as_slice() {
        println!("Concatenating {} + {}...", cli.source.display(), target.display());
        concat(cli.source.as_path(), target.as_path(), Some(cli.output.as_path()))?;
    } else {
        println!("Concatenating {} + {} files...", cli.source.display(), targets.len());
        concat_multiple(cli.source.as_path(), &targets, Some(cli.output.as_path()))?;
    }

    println!("Successfully created: {}", cli.output.display());
    Ok(())
}

/// Expand glob patterns in target paths
///
/// An argument naming an existing file is taken literally even if it contains
/// glob characters. Matches of one pattern are sorted; patterns keep their
/// command-line order.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let literal = Path::new(&pattern);
        if literal.exists() || !is_glob(&pattern) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(_) => bail!("Target file '{}' not found", pattern),
        };

        let mut matched: Vec<PathBuf> = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => matched.push(path),
                Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
            }
        }
        if matched.is_empty() {
            bail!("No files matched pattern: {}", pattern);
        }
        matched.sort();
        paths.extend(matched);
    }

    Ok(paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}
