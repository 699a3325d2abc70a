//! Client-side sync core for an environmental-sensor telemetry service.
//!
//! This crate keeps a local, observable copy of what an aggregation service
//! knows about one multi-channel air-quality sensor. The service exposes four
//! read-only JSON resources:
//!
//! | Resource | Endpoint | Refreshed by |
//! |----------|----------|--------------|
//! | Latest reading | `GET /status` | full refresh, every poll tick |
//! | Raw readings | `GET /history?hours=N` | full refresh |
//! | Per-channel statistics | `GET /stats?hours=N` | full refresh, every poll tick |
//! | Correlations, trends, AQI | `GET /analysis?hours=N` | full refresh |
//!
//! # Features
//!
//! - **Shared state**: one [`SyncState`] per client, readable as a snapshot
//!   or watched for changes
//! - **Stale-but-valid**: a failed fetch never clears data; the resource is
//!   marked stale in its [`ResourceHealth`] instead
//! - **Freshest request wins**: a slow, older response cannot overwrite
//!   newer data
//! - **Polling**: periodic refresh of `status` and `stats` with a single
//!   active timer per client
//! - **Sessions**: an [`ActiveSession`] guard stops polling and discards
//!   late responses when the consumer goes away
//! - **Testing**: [`MockApi`] implements [`SensorApi`] without a server
//!
//! # Quick Start
//!
//! ```no_run
//! use airsync_core::{ServiceClient, SyncClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = ServiceClient::new("http://localhost:8080")?;
//!     let sync = SyncClient::new(api);
//!
//!     // Load everything once, then keep status and stats fresh
//!     let session = sync.activate().await?;
//!
//!     let mut changes = session.subscribe();
//!     while changes.changed().await.is_ok() {
//!         if let Some(latest) = &changes.borrow_and_update().latest {
//!             println!("CO2: {} ppm", latest.co2);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod fetch;
pub mod mock;
pub mod poller;
pub mod resource;
pub mod session;
pub mod state;
pub mod sync;
pub mod traits;

// Core exports
pub use client::{DEFAULT_API_PREFIX, ServiceClient, ServiceClientBuilder};
pub use error::{Error, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, SyncEvent, event_channel};
pub use fetch::FetchOutcome;
pub use mock::{MockApi, MockApiBuilder};
pub use poller::POLLED_RESOURCES;
pub use resource::Resource;
pub use session::ActiveSession;
pub use state::{HealthMap, ResourceHealth, SyncState, Ticket};
pub use sync::{BATCH_FAILED_MESSAGE, BatchReport, SyncClient, SyncOptions, SyncOptionsBuilder};
pub use traits::SensorApi;

// Re-export from airsync-types
pub use airsync_types::{
    AnalysisSnapshot, Channel, ChannelStats, DEFAULT_WINDOW_HOURS, HistoryBatch, SensorReading,
    Severity, StatsSnapshot, StatusResponse,
};

/// Type alias for a sync client talking to the real service.
pub type HttpSyncClient = SyncClient<ServiceClient>;
