//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use airsync_core::ServiceClient;

use crate::config::Config;

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    config.validate()?;
    Ok(config)
}

/// Build an HTTP client from the `[service]` section, with `url`
/// overriding the configured base URL.
pub fn service_client(config: &Config, url: Option<&str>) -> Result<ServiceClient> {
    let base_url = url.unwrap_or(&config.service.base_url);
    let mut builder = ServiceClient::builder(base_url).api_prefix(&config.service.api_prefix);
    if let Some(timeout) = config.service.timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .with_context(|| format!("Invalid service URL '{}'", base_url))
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Append output to a file, or print it to stdout.
pub fn append_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.txt");

        write_output(Some(&path), "first\n").unwrap();
        write_output(Some(&path), "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");

        append_output(Some(&path), "third\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\nthird\n");
    }

    #[test]
    fn test_url_flag_overrides_config() {
        let config = Config::default();
        let client = service_client(&config, Some("http://10.1.2.3:9000/")).unwrap();
        assert_eq!(client.base_url(), "http://10.1.2.3:9000");

        let client = service_client(&config, None).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let err = service_client(&Config::default(), Some("ftp://nowhere")).unwrap_err();
        assert!(err.to_string().contains("ftp://nowhere"));
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[service]\nbase_url = \"http://sensor.local\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.service.base_url, "http://sensor.local");
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[polling]\ninterval_ms = 0\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
