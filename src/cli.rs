use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::cache::CACHE_FILE_NAME;

#[derive(Parser, Debug)]
#[command(name = "workaround-tracker")]
#[command(
    version,
    about = "Find workarounds whose upstream issue has been resolved",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Check source paths for redundant workarounds
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Files or directories to scan
    pub source_paths: Vec<PathBuf>,

    /// Path to custom config file
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,

    /// Scan cache location
    #[arg(long, default_value = CACHE_FILE_NAME)]
    pub cache_file: PathBuf,

    /// Neither read nor write the scan cache
    #[arg(long)]
    pub no_cache: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (if not specified, writes to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table output for terminal
    Terminal,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}
