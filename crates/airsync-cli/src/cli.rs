//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "airsync")]
#[command(author, version, about = "Client for an environmental-sensor telemetry service", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "AIRSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service base URL (overrides the config file)
    #[arg(short, long, global = true, env = "AIRSYNC_URL")]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the latest reading
    Status,

    /// List raw readings over a window, oldest first
    History {
        /// Window size in hours (defaults to the configured window)
        #[arg(long)]
        hours: Option<u32>,

        /// Only print the newest N readings
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show per-channel statistics over a window
    Stats {
        /// Window size in hours (defaults to the configured window)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Show correlations, hourly trends and AQI over a window
    Analysis {
        /// Window size in hours (defaults to the configured window)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Fetch all four resources once and report what happened
    Refresh,

    /// Keep status and stats fresh, printing every update
    Watch {
        /// Poll interval in milliseconds (defaults to the configured interval)
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Stop after N updates (0 for unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,
    },

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}
