//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CRPT Dispatch - rate-limited document submission
#[derive(Parser, Debug)]
#[command(
    name = "crpt-dispatch",
    author,
    version,
    about = "Rate-limited CRPT document dispatcher",
    long_about = "Submits documents to the CRPT document endpoint without exceeding a\n\
                  fixed number of requests per time window.\n\n\
                  Submissions are queued in order; a window timer drains at most\n\
                  `max_per_window` documents per window and stops once the queue is empty."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CRPT_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CRPT_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit sample documents through the dispatcher
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "CRPT_DISPATCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of sample documents to submit (doc ids 0..N)
    #[arg(short = 'n', long, default_value = "10", env = "CRPT_DISPATCH_DOCUMENTS")]
    pub documents: u64,

    /// Override the rate window length in milliseconds
    #[arg(long, env = "CRPT_DISPATCH_WINDOW_MS")]
    pub window_ms: Option<u64>,

    /// Override the maximum number of requests per window
    #[arg(long, allow_negative_numbers = true, env = "CRPT_DISPATCH_MAX_PER_WINDOW")]
    pub max_per_window: Option<i64>,

    /// Log payloads instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CRPT_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
