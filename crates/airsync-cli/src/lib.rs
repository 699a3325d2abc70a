//! Command-line client for an environmental-sensor telemetry service.
//!
//! The `airsync` binary talks to the aggregation service through
//! [`airsync_core`] and prints what it finds.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `status` | Latest reading |
//! | `history` | Raw readings over a window, oldest first |
//! | `stats` | Per-channel statistics and anomalies |
//! | `analysis` | Correlations, hourly trends, AQI and suggestions |
//! | `refresh` | Fetch all four resources once and report per resource |
//! | `watch` | Keep status and stats fresh and print every update |
//! | `config` | Print or save the effective configuration |
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored output
//! - **JSON**: Machine-readable JSON; `watch` emits one document per line
//!
//! # Configuration
//!
//! Settings live in `<config_dir>/airsync/config.toml`; see [`config`].
//!
//! # Environment Variables
//!
//! - `AIRSYNC_URL`: Service base URL (overridden by `--url`)
//! - `AIRSYNC_CONFIG`: Configuration file (overridden by `--config`)
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter, default `airsync=info`
//!
//! # Examples
//!
//! ```bash
//! airsync --url http://10.0.0.5:8080 status
//! airsync history --hours 6 --limit 20
//! airsync stats --format json
//! airsync watch --interval-ms 2000
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod style;
pub mod util;

use std::time::Duration;

use anyhow::Result;

use airsync_core::SyncClient;

use crate::cli::{Cli, Commands};
use crate::config::default_config_path;
use crate::format::FormatOptions;
use crate::util::{load_config, service_client};

pub use airsync_core;
pub use airsync_types;

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let opts = FormatOptions::new(cli.no_color, cli.compact);
    let output = cli.output.as_ref();
    let window = config.polling.window_hours;

    if let Commands::Config { save } = cli.command {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        return commands::cmd_config(&config, &path, save, cli.format, output, &opts);
    }

    let mut options = config.sync_options();
    if let Commands::Watch {
        interval_ms: Some(interval_ms),
        ..
    } = cli.command
    {
        options.poll_interval = Duration::from_millis(interval_ms);
    }

    let api = service_client(&config, cli.url.as_deref())?;
    tracing::debug!("Using service at {}", api.base_url());
    let sync = SyncClient::with_options(api, options)?;

    match cli.command {
        Commands::Status => commands::cmd_status(&sync, cli.format, output, &opts).await,
        Commands::History { hours, limit } => {
            let args = commands::HistoryArgs {
                hours: hours.unwrap_or(window),
                limit,
                format: cli.format,
                output,
                opts: &opts,
            };
            commands::cmd_history(&sync, args).await
        }
        Commands::Stats { hours } => {
            commands::cmd_stats(&sync, hours.unwrap_or(window), cli.format, output, &opts).await
        }
        Commands::Analysis { hours } => {
            commands::cmd_analysis(&sync, hours.unwrap_or(window), cli.format, output, &opts).await
        }
        Commands::Refresh => commands::cmd_refresh(&sync, cli.format, output, &opts).await,
        Commands::Watch { count, .. } => {
            let args = commands::WatchArgs {
                count,
                format: cli.format,
                output,
                opts: &opts,
            };
            commands::cmd_watch(&sync, args).await
        }
        Commands::Config { .. } => Ok(()),
    }
}
