//! Example: One Full Refresh
//!
//! This example fetches all four resources once and prints the outcome of
//! each, followed by the stats summary when it arrived.
//!
//! Run with: `cargo run --example refresh_once -- <BASE_URL> [HOURS]`

use std::env;

use airsync_core::{ServiceClient, SyncClient, SyncOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let base_url = args.get(1).map(String::as_str).unwrap_or("http://127.0.0.1:8080");
    let hours = match args.get(2) {
        Some(hours) => hours.parse()?,
        None => airsync_core::DEFAULT_WINDOW_HOURS,
    };

    let options = SyncOptions::builder().window_hours(hours).build();
    let sync = SyncClient::with_options(ServiceClient::new(base_url)?, options)?;

    let report = sync.refresh_all().await;
    for (resource, outcome) in &report.outcomes {
        println!("{:<9} {}", resource.to_string(), outcome);
    }

    let state = sync.state();
    if let Some(stats) = &state.stats {
        println!();
        println!("{} samples over {}h", stats.count, stats.hours);
        for (channel, channel_stats) in stats.stats.iter() {
            if channel_stats.has_data() {
                println!(
                    "  {:<18} avg {:>8.1} {}",
                    channel.label(),
                    channel_stats.avg,
                    channel.unit()
                );
            }
        }
        for anomaly in &stats.anomalies {
            println!("  [{}] {}", anomaly.level, anomaly.message);
        }
    }

    Ok(())
}
