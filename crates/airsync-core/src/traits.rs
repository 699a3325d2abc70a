//! Trait abstraction over the telemetry service.
//!
//! [`SensorApi`] lets the sync layer run against the real HTTP client or
//! against [`MockApi`](crate::MockApi) in tests.

use async_trait::async_trait;

use airsync_types::{AnalysisSnapshot, HistoryBatch, StatsSnapshot, StatusResponse};

use crate::error::Result;

/// Read access to the four service resources.
///
/// Implementations decode the wire payload and report non-success answers
/// as errors; they do not validate invariants or touch any shared state.
///
/// # Example
///
/// ```ignore
/// use airsync_core::{SensorApi, Result};
///
/// async fn print_co2<A: SensorApi>(api: &A) -> Result<()> {
///     let status = api.status().await?;
///     println!("CO2: {} ppm", status.last_data.co2);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SensorApi: Send + Sync {
    /// Read the latest sample.
    async fn status(&self) -> Result<StatusResponse>;

    /// Read raw samples from the last `hours`, in service order (newest first).
    async fn history(&self, hours: u32) -> Result<HistoryBatch>;

    /// Read per-channel statistics over the last `hours`.
    async fn stats(&self, hours: u32) -> Result<StatsSnapshot>;

    /// Read the derived analysis over the last `hours`.
    async fn analysis(&self, hours: u32) -> Result<AnalysisSnapshot>;

    /// Where the data comes from, for log messages.
    fn source(&self) -> &str;
}
