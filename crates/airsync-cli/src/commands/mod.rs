//! Command implementations for the CLI.

mod analysis;
mod config;
mod history;
mod refresh;
mod stats;
mod status;
mod watch;

pub use analysis::cmd_analysis;
pub use config::cmd_config;
pub use history::{HistoryArgs, cmd_history};
pub use refresh::cmd_refresh;
pub use stats::cmd_stats;
pub use status::cmd_status;
pub use watch::{WatchArgs, cmd_watch};

use anyhow::{Result, bail};

use airsync_core::{FetchOutcome, Resource};

/// Turn a single-resource outcome into a command result.
fn ensure_applied(resource: Resource, outcome: FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Applied => Ok(()),
        FetchOutcome::Failed { reason } => bail!("Failed to fetch {}: {}", resource, reason),
        other => bail!("Fetch of {} was not stored: {}", resource, other),
    }
}
