//! Refresh command implementation.

use std::path::PathBuf;

use anyhow::{Result, bail};

use airsync_core::{BatchReport, SensorApi, SyncClient};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, ReportJson, format_report_text};
use crate::util::write_output;

/// Run one full batch and print what happened to each resource.
///
/// Fails only when nothing was stored or the batch itself failed; partial
/// results still print.
pub async fn cmd_refresh<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let report = sync.refresh_all().await;
    let content = render_report(&report, format, opts)?;
    write_output(output, &content)?;

    if let Some(error) = &report.error {
        bail!("Refresh failed: {}", error);
    }
    if report.applied() == 0 {
        bail!("Refresh failed: no resource could be fetched");
    }
    Ok(())
}

fn render_report(report: &BatchReport, format: OutputFormat, opts: &FormatOptions) -> Result<String> {
    match format {
        OutputFormat::Json => opts.as_json(&ReportJson::from(report)),
        OutputFormat::Text => Ok(format_report_text(report, opts)),
    }
}
