//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::FormatOptions;
use crate::style;
use crate::util::write_output;

/// Print the effective configuration, optionally writing it to `path`.
pub fn cmd_config(
    config: &Config,
    path: &Path,
    save: bool,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    if save {
        config.save(path)?;
        eprintln!(
            "{}",
            style::format_success(&format!("Saved {}", path.display()), opts.no_color)
        );
    }

    let content = match format {
        OutputFormat::Json => opts.as_json(config)?,
        OutputFormat::Text => {
            toml::to_string_pretty(config).context("Failed to serialize configuration")?
        }
    };
    write_output(output, &content)
}
