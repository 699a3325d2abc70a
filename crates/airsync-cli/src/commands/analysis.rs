//! Analysis command implementation.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use airsync_core::{Resource, SensorApi, SyncClient};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_analysis_text};
use crate::util::write_output;

use super::ensure_applied;

pub async fn cmd_analysis<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    hours: u32,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let content = render_analysis(sync, hours, format, opts).await?;
    write_output(output, &content)
}

async fn render_analysis<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    hours: u32,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<String> {
    ensure_applied(Resource::Analysis, sync.refresh_analysis(hours).await)?;

    let state = sync.state();
    let analysis = state
        .analysis
        .as_ref()
        .ok_or_else(|| anyhow!("No analysis available"))?;

    match format {
        OutputFormat::Json => opts.as_json(analysis),
        OutputFormat::Text => Ok(format_analysis_text(analysis, opts)),
    }
}
