//! Watch command implementation.
//!
//! Activates a session (one full refresh, then polling of status and stats)
//! and prints the state every time it changes in a visible way. The session
//! is deactivated on Ctrl+C or once the requested number of updates has been
//! printed.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;

use airsync_core::{SensorApi, SyncClient, SyncState};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_watch_update};
use crate::util::append_output;

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub count: u32,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch<A: SensorApi + 'static>(
    sync: &SyncClient<A>,
    args: WatchArgs<'_>,
) -> Result<()> {
    watch_until(sync, args, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

fn render_update(state: &SyncState, format: OutputFormat, opts: &FormatOptions) -> Result<String> {
    match format {
        // One JSON document per line
        OutputFormat::Json => FormatOptions::new(opts.no_color, true).as_json(state),
        OutputFormat::Text => Ok(format_watch_update(state, opts)),
    }
}

async fn watch_until<A, F>(sync: &SyncClient<A>, args: WatchArgs<'_>, shutdown: F) -> Result<()>
where
    A: SensorApi + 'static,
    F: Future<Output = ()>,
{
    let WatchArgs {
        count,
        format,
        output,
        opts,
    } = args;

    let mut updates = sync.subscribe();
    eprintln!(
        "Watching {} every {} ms. Press Ctrl+C to stop.",
        sync.api().source(),
        sync.options().poll_interval.as_millis()
    );

    let session = sync.activate().await?;
    tokio::pin!(shutdown);

    let mut printed: u32 = 0;
    let mut last: Option<String> = None;

    loop {
        let rendered = {
            let state = updates.borrow_and_update();
            if state.loading {
                None
            } else {
                Some(render_update(&state, format, opts)?)
            }
        };

        if let Some(content) = rendered
            && last.as_deref() != Some(content.as_str())
        {
            append_output(output, &content)?;
            printed += 1;
            last = Some(content);

            if count > 0 && printed >= count {
                eprintln!("Completed {} updates.", printed);
                break;
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                eprintln!("\nShutting down...");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    session.deactivate();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use airsync_core::mock::fixtures;
    use airsync_core::{MockApi, SyncOptions};

    fn client() -> SyncClient<MockApi> {
        let options = SyncOptions::builder()
            .poll_interval(Duration::from_millis(1000))
            .build();
        SyncClient::with_options(MockApi::new(), options).unwrap()
    }

    fn lines(path: &PathBuf) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Reading lines only, skipping the indented detail lines.
    fn readings(path: &PathBuf) -> Vec<String> {
        lines(path)
            .into_iter()
            .filter(|line| !line.starts_with(' '))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_stops_and_deactivates() {
        let sync = client();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("watch.txt");
        let opts = FormatOptions::new(true, false);

        let args = WatchArgs {
            count: 1,
            format: OutputFormat::Text,
            output: Some(&path),
            opts: &opts,
        };
        watch_until(&sync, args, std::future::pending()).await.unwrap();

        let printed = readings(&path);
        assert_eq!(printed.len(), 1);
        assert!(printed[0].starts_with("2025-01-15 12:00:00"));
        assert!(lines(&path).iter().any(|line| line.contains("WARNING")));
        assert!(!sync.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_reading_is_printed() {
        let sync = client();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("watch.txt");
        let opts = FormatOptions::new(true, false);

        let api_client = sync.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            let next = fixtures::sample_reading(99, fixtures::anchor() + time::Duration::minutes(5));
            api_client.api().set_status(Some(next)).await;
        });

        let args = WatchArgs {
            count: 2,
            format: OutputFormat::Text,
            output: Some(&path),
            opts: &opts,
        };
        watch_until(&sync, args, std::future::pending()).await.unwrap();

        let printed = readings(&path);
        assert_eq!(printed.len(), 2);
        assert!(printed[1].starts_with("2025-01-15 12:05:00"));
        assert!(!sync.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_ends_watch() {
        let sync = client();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("watch.jsonl");
        let opts = FormatOptions::default();

        let args = WatchArgs {
            count: 0,
            format: OutputFormat::Json,
            output: Some(&path),
            opts: &opts,
        };
        watch_until(&sync, args, tokio::time::sleep(Duration::from_millis(3500)))
            .await
            .unwrap();

        let printed = lines(&path);
        assert!(!printed.is_empty());
        for line in &printed {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["loading"], false);
        }
        assert!(!sync.is_polling());
        assert!(sync.state().latest.is_some());
    }
}
