//! Status command implementation.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use airsync_core::{Resource, SensorApi, SyncClient};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_reading_text};
use crate::util::write_output;

use super::ensure_applied;

pub async fn cmd_status<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let content = render_status(sync, format, opts).await?;
    write_output(output, &content)
}

async fn render_status<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    format: OutputFormat,
    opts: &FormatOptions,
) -> Result<String> {
    ensure_applied(Resource::Status, sync.refresh_status().await)?;

    let state = sync.state();
    let reading = state
        .latest
        .as_ref()
        .ok_or_else(|| anyhow!("No reading available"))?;

    match format {
        OutputFormat::Json => opts.as_json(reading),
        OutputFormat::Text => Ok(format_reading_text(reading, opts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsync_core::MockApi;

    #[tokio::test]
    async fn test_status_text() {
        let sync = SyncClient::new(MockApi::new());
        let text = render_status(&sync, OutputFormat::Text, &FormatOptions::new(true, false))
            .await
            .unwrap();
        assert!(text.starts_with("Reading #"));
    }

    #[tokio::test]
    async fn test_status_json() {
        let sync = SyncClient::new(MockApi::new());
        let json = render_status(&sync, OutputFormat::Json, &FormatOptions::default())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["co2"].is_number());
        assert!(value["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_status_failure_is_an_error() {
        let sync = SyncClient::new(MockApi::empty());
        let err = render_status(&sync, OutputFormat::Text, &FormatOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch status"));
    }
}
