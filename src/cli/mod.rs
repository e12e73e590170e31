//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rotator")]
#[command(author, version, about = "Cross-sectional momentum/reversal rotation engine")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Also write JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a rotation strategy over CSV histories
    Replay(ReplayArgs),
    /// List built-in presets
    Presets(PresetsArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Preset to start from instead of the [engine] section
    #[arg(short, long)]
    pub preset: Option<String>,

    /// JSON object overriding preset fields
    #[arg(long, requires = "preset")]
    pub overrides: Option<String>,

    /// Universe (comma-separated), replaces the configured one
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Directory with one CSV per security
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// First session to replay (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Last session to replay (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Save the JSON report to file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct PresetsArgs {
    /// Print each preset's default configuration
    #[arg(long)]
    pub verbose: bool,
}
