//! Example: Watching the Latest Reading
//!
//! This example activates a sync session against a running telemetry
//! service and prints the CO₂ and PM2.5 values whenever a poll brings in a
//! new reading. Press Ctrl+C to stop.
//!
//! Run with: `cargo run --example watch_status -- <BASE_URL>`

use std::env;
use std::time::Duration;

use airsync_core::{ServiceClient, SyncClient, SyncOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let base_url = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());

    let options = SyncOptions::builder()
        .poll_interval(Duration::from_secs(5))
        .build();
    let sync = SyncClient::with_options(ServiceClient::new(&base_url)?, options)?;

    println!("Connecting to {}...", base_url);
    let mut updates = sync.subscribe();
    let session = sync.activate().await?;

    let mut last_id = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let state = updates.borrow_and_update();
        if let Some(reading) = &state.latest
            && last_id != Some(reading.id)
        {
            last_id = Some(reading.id);
            println!(
                "#{:<6} CO₂ {:>5.0} ppm  PM2.5 {:>5.1} µg/m³{}",
                reading.id,
                reading.co2,
                reading.pm25,
                if state.health(airsync_core::Resource::Status).is_stale() {
                    "  (stale)"
                } else {
                    ""
                }
            );
        }
    }

    session.deactivate();
    println!("Stopped.");
    Ok(())
}
