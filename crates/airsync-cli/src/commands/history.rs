//! History command implementation.

use std::path::PathBuf;

use anyhow::Result;

use airsync_core::{Resource, SensorApi, SyncClient};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_history_text};
use crate::util::write_output;

use super::ensure_applied;

/// Arguments for the history command.
pub struct HistoryArgs<'a> {
    pub hours: u32,
    pub limit: Option<usize>,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_history<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    args: HistoryArgs<'_>,
) -> Result<()> {
    let content = render_history(sync, &args).await?;
    write_output(args.output, &content)
}

async fn render_history<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    args: &HistoryArgs<'_>,
) -> Result<String> {
    ensure_applied(Resource::History, sync.refresh_history(args.hours).await)?;

    let state = sync.state();
    // Stored oldest first; the limit keeps the newest readings.
    let skip = args
        .limit
        .map_or(0, |limit| state.history.len().saturating_sub(limit));
    let readings = &state.history[skip..];

    match args.format {
        OutputFormat::Json => args.opts.as_json(&readings),
        OutputFormat::Text => Ok(format_history_text(readings, args.opts)),
    }
}
