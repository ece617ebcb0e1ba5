//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scroll Sync - keep horizontally scrollable regions in lockstep
#[derive(Parser, Debug)]
#[command(
    name = "scroll-sync",
    author,
    version,
    about = "Horizontal scroll synchronization engine",
    long_about = "Drives the scroll sync engine against in-memory regions.\n\n\
                  Simulates scroll gestures, validates configuration files and \n\
                  prints the effective engine settings."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SCROLL_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SCROLL_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate scroll gestures across mock regions
    Simulate(SimulateArgs),

    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Configuration file (TOML or JSON); defaults are used when omitted
    #[arg(short, long, env = "SCROLL_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of synchronized regions
    #[arg(long, default_value = "3")]
    pub regions: usize,

    /// Number of gestures; the leader rotates through the regions
    #[arg(long, default_value = "2")]
    pub gestures: u32,

    /// Scroll events per gesture
    #[arg(long, default_value = "20")]
    pub events: u32,

    /// Delay between scroll events (ms)
    #[arg(long, default_value = "4")]
    pub input_interval_ms: u64,

    /// Distance scrolled per gesture (px)
    #[arg(long, default_value = "480")]
    pub distance: f64,

    /// Add a follow-only region moving at this speed
    #[arg(long)]
    pub follower_speed: Option<f64>,

    /// Run on virtual time instead of the tokio runtime
    #[arg(long)]
    pub offline: bool,

    /// Overall timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "SCROLL_SYNC_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (overrides configuration)
    #[arg(long, env = "SCROLL_SYNC_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "scroll-sync.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults are shown when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

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

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
