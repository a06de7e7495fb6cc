//! CLI argument definitions.

use crate::constants::CONFIG_ENV_VAR;
use crate::output::HistoryFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Identify birds from recordings and keep a log of what you heard.
#[derive(Debug, Parser)]
#[command(name = "birdlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file to use instead of the platform default.
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// Suppress progress output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify the bird in a recording and log the observation.
    Identify(IdentifyArgs),
    /// Show logged observations.
    History {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = HistoryFormat::Table)]
        format: HistoryFormat,
    },
    /// List the species the classifier can report.
    Labels,
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `identify`.
#[derive(Debug, Args)]
pub struct IdentifyArgs {
    /// Recording to identify (any format symphonia can decode).
    pub file: PathBuf,

    /// Location recorded with the observation.
    #[arg(short, long, value_parser = parse_location)]
    pub location: Option<String>,

    /// Path to the ONNX model, overriding the configured one.
    #[arg(long, env = "BIRDLOG_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to the labels file, overriding the configured one.
    #[arg(long, env = "BIRDLOG_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Do not append the result to the observation log.
    #[arg(long)]
    pub no_save: bool,

    /// Save the recording as a WAV clip next to the log.
    #[arg(long, conflicts_with = "no_save")]
    pub keep_clip: bool,

    /// Replay the recording at its own speed instead of as fast as possible.
    #[arg(long)]
    pub realtime: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    pub no_progress: bool,
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Parse and validate a location string.
fn parse_location(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("location must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}
