//! Stats command implementation.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use airsync_core::{Resource, SensorApi, SyncClient};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_stats_text};
use crate::util::write_output;

use super::ensure_applied;

pub async fn cmd_stats<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    hours: u32,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let content = render_stats(sync, hours, format, opts).await?;
    write_output(output, &content)
}

async fn render_stats<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    hours: u32,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<String> {
    ensure_applied(Resource::Stats, sync.refresh_stats(hours).await)?;

    let state = sync.state();
    let stats = state
        .stats
        .as_ref()
        .ok_or_else(|| anyhow!("No statistics available"))?;

    match format {
        OutputFormat::Json => opts.as_json(stats),
        OutputFormat::Text => Ok(format_stats_text(stats, opts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsync_core::MockApi;

    #[tokio::test]
    async fn test_stats_json_uses_window() {
        let sync = SyncClient::new(MockApi::new());
        let json = render_stats(&sync, 12, OutputFormat::Json, &FormatOptions::default())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["stats"]["co2"]["avg"].is_number());
        assert_eq!(sync.api().last_hours(), Some(12));
    }

    #[tokio::test]
    async fn test_empty_window_is_an_error() {
        let sync = SyncClient::new(MockApi::empty());
        let err = render_stats(&sync, 24, OutputFormat::Text, &FormatOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch stats"));
    }
}
