//! Mock service implementation for testing.
//!
//! [`MockApi`] implements [`SensorApi`] from in-memory fixtures, so the sync
//! layer can be exercised without a running service.
//!
//! # Features
//!
//! - **Failure injection**: Answer a resource with an HTTP error status
//! - **Latency simulation**: Delay each resource by a fixed duration
//! - **Panic injection**: Make a resource's fetch task die
//! - **Call tracking**: Count calls per resource and record the last window
//!
//! Fixture, failure and latency are read when a call starts. Changing them
//! afterwards does not affect calls already in flight, which makes it easy
//! to stage an older request that finishes after a newer one.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use airsync_types::{
    AnalysisSnapshot, HistoryBatch, SensorReading, StatsSnapshot, StatusResponse,
};

use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::traits::SensorApi;

/// An in-memory telemetry service for tests.
///
/// # Example
///
/// ```
/// use airsync_core::{MockApi, SensorApi};
///
/// #[tokio::main]
/// async fn main() {
///     let api = MockApi::new();
///     let status = api.status().await.unwrap();
///     assert!(status.last_data.co2 > 0.0);
/// }
/// ```
pub struct MockApi {
    status: RwLock<Option<SensorReading>>,
    history: RwLock<Vec<SensorReading>>,
    stats: RwLock<Option<StatsSnapshot>>,
    analysis: RwLock<Option<AnalysisSnapshot>>,
    /// HTTP status to fail with, per resource (0 = succeed).
    failures: [AtomicU16; 4],
    /// Simulated latency in milliseconds, per resource.
    latency_ms: [AtomicU64; 4],
    panics: [AtomicBool; 4],
    calls: [AtomicU32; 4],
    /// Last `hours` argument seen (`u64::MAX` = none yet).
    last_hours: AtomicU64,
}

impl std::fmt::Debug for MockApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApi")
            .field("calls", &self.total_calls())
            .field("last_hours", &self.last_hours())
            .finish()
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Create a mock that serves the sample fixtures.
    pub fn new() -> Self {
        MockApiBuilder::new().build()
    }

    /// Create a mock with no data at all: `/status` answers 404 and the
    /// windowed resources answer with an empty-window notice.
    pub fn empty() -> Self {
        Self {
            status: RwLock::new(None),
            history: RwLock::new(Vec::new()),
            stats: RwLock::new(None),
            analysis: RwLock::new(None),
            failures: Default::default(),
            latency_ms: Default::default(),
            panics: Default::default(),
            calls: Default::default(),
            last_hours: AtomicU64::new(u64::MAX),
        }
    }

    /// Start configuring a mock.
    pub fn builder() -> MockApiBuilder {
        MockApiBuilder::new()
    }

    // --- Test control methods ---

    /// Set the reading served by `/status`. `None` makes it answer 404.
    pub async fn set_status(&self, reading: Option<SensorReading>) {
        *self.status.write().await = reading;
    }

    /// Set the readings served by `/history`, newest first.
    pub async fn set_history(&self, readings: Vec<SensorReading>) {
        *self.history.write().await = readings;
    }

    /// Set the snapshot served by `/stats`. `None` means an empty window.
    pub async fn set_stats(&self, stats: Option<StatsSnapshot>) {
        *self.stats.write().await = stats;
    }

    /// Set the snapshot served by `/analysis`. `None` means an empty window.
    pub async fn set_analysis(&self, analysis: Option<AnalysisSnapshot>) {
        *self.analysis.write().await = analysis;
    }

    /// Make a resource answer with the given HTTP status, or succeed again
    /// with `None`.
    pub fn set_failure(&self, resource: Resource, status: Option<u16>) {
        self.failures[resource.index()].store(status.unwrap_or(0), Ordering::Relaxed);
    }

    /// Make every resource answer with the given HTTP status.
    pub fn fail_all(&self, status: Option<u16>) {
        for resource in Resource::ALL {
            self.set_failure(resource, status);
        }
    }

    /// Set simulated latency for one resource.
    pub fn set_latency(&self, resource: Resource, latency: Duration) {
        self.latency_ms[resource.index()].store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Set the same simulated latency for every resource.
    pub fn set_latency_all(&self, latency: Duration) {
        for resource in Resource::ALL {
            self.set_latency(resource, latency);
        }
    }

    /// Make calls for a resource panic.
    pub fn set_panic(&self, resource: Resource, panic: bool) {
        self.panics[resource.index()].store(panic, Ordering::Relaxed);
    }

    /// Number of calls made for a resource.
    pub fn call_count(&self, resource: Resource) -> u32 {
        self.calls[resource.index()].load(Ordering::Relaxed)
    }

    /// Number of calls made across all resources.
    pub fn total_calls(&self) -> u32 {
        Resource::ALL.iter().map(|r| self.call_count(*r)).sum()
    }

    /// Reset all call counters.
    pub fn reset_calls(&self) {
        for counter in &self.calls {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// The `hours` argument of the most recent windowed call.
    pub fn last_hours(&self) -> Option<u32> {
        match self.last_hours.load(Ordering::Relaxed) {
            u64::MAX => None,
            hours => Some(hours as u32),
        }
    }

    /// Register a call and return the latency and failure it should see.
    fn begin(&self, resource: Resource, hours: Option<u32>) -> (Duration, Option<u16>) {
        let idx = resource.index();
        self.calls[idx].fetch_add(1, Ordering::Relaxed);
        if let Some(hours) = hours {
            self.last_hours.store(u64::from(hours), Ordering::Relaxed);
        }

        if self.panics[idx].load(Ordering::Relaxed) {
            panic!("mock {} fetch panicked", resource);
        }

        let latency = Duration::from_millis(self.latency_ms[idx].load(Ordering::Relaxed));
        let failure = match self.failures[idx].load(Ordering::Relaxed) {
            0 => None,
            status => Some(status),
        };
        (latency, failure)
    }

    async fn finish<T>(latency: Duration, failure: Option<u16>, value: Result<T>) -> Result<T> {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(status) => Err(Error::Api {
                status,
                message: "mock failure".to_string(),
            }),
            None => value,
        }
    }
}

#[async_trait]
impl SensorApi for MockApi {
    async fn status(&self) -> Result<StatusResponse> {
        let (latency, failure) = self.begin(Resource::Status, None);
        let value = match self.status.read().await.clone() {
            Some(reading) => Ok(StatusResponse {
                last_sequence: Some(reading.sequence_num),
                sensor_status: Some("ok".to_string()),
                last_data: reading,
            }),
            None => Err(Error::Api {
                status: 404,
                message: "no data".to_string(),
            }),
        };
        Self::finish(latency, failure, value).await
    }

    async fn history(&self, hours: u32) -> Result<HistoryBatch> {
        let (latency, failure) = self.begin(Resource::History, Some(hours));
        let data = self.history.read().await.clone();
        let value = Ok(HistoryBatch {
            count: data.len(),
            data,
        });
        Self::finish(latency, failure, value).await
    }

    async fn stats(&self, hours: u32) -> Result<StatsSnapshot> {
        let (latency, failure) = self.begin(Resource::Stats, Some(hours));
        let value = self.stats.read().await.clone().ok_or_else(|| Error::NoData {
            resource: Resource::Stats,
            message: "no data in the specified time range".to_string(),
        });
        Self::finish(latency, failure, value).await
    }

    async fn analysis(&self, hours: u32) -> Result<AnalysisSnapshot> {
        let (latency, failure) = self.begin(Resource::Analysis, Some(hours));
        let value = self.analysis.read().await.clone().ok_or_else(|| Error::NoData {
            resource: Resource::Analysis,
            message: "no data".to_string(),
        });
        Self::finish(latency, failure, value).await
    }

    fn source(&self) -> &str {
        "mock"
    }
}

/// Builder for [`MockApi`].
#[derive(Debug, Clone)]
pub struct MockApiBuilder {
    status: Option<SensorReading>,
    history: Vec<SensorReading>,
    stats: Option<StatsSnapshot>,
    analysis: Option<AnalysisSnapshot>,
    latency: Duration,
}

impl Default for MockApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApiBuilder {
    /// Start from the sample fixtures.
    pub fn new() -> Self {
        let history = fixtures::sample_history(12);
        Self {
            status: history.first().cloned(),
            history,
            stats: Some(fixtures::sample_stats(24)),
            analysis: Some(fixtures::sample_analysis(24)),
            latency: Duration::ZERO,
        }
    }

    /// Set the `/status` reading.
    #[must_use]
    pub fn status(mut self, reading: SensorReading) -> Self {
        self.status = Some(reading);
        self
    }

    /// Set the `/history` readings, newest first.
    #[must_use]
    pub fn history(mut self, readings: Vec<SensorReading>) -> Self {
        self.history = readings;
        self
    }

    /// Set the `/stats` snapshot.
    #[must_use]
    pub fn stats(mut self, stats: StatsSnapshot) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Set the `/analysis` snapshot.
    #[must_use]
    pub fn analysis(mut self, analysis: AnalysisSnapshot) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Set the latency of every resource.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Build the mock.
    pub fn build(self) -> MockApi {
        let api = MockApi::empty();
        api.set_latency_all(self.latency);
        MockApi {
            status: RwLock::new(self.status),
            history: RwLock::new(self.history),
            stats: RwLock::new(self.stats),
            analysis: RwLock::new(self.analysis),
            ..api
        }
    }
}

/// Sample payloads shaped like real service answers.
pub mod fixtures {
    use std::collections::BTreeMap;

    use time::{Duration, OffsetDateTime};

    use airsync_types::{
        AnalysisSnapshot, Anomaly, AqiRecord, ChannelStats, ChannelStatsSet, HourlyTrend,
        PeakHour, PeakHours, SensorReading, Severity, StatsSnapshot, Suggestion,
    };

    /// Fixed anchor so fixtures are reproducible.
    pub fn anchor() -> OffsetDateTime {
        // 2025-01-15T12:00:00Z
        OffsetDateTime::from_unix_timestamp(1_736_942_400).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// A plausible indoor reading.
    pub fn sample_reading(id: u64, created_at: OffsetDateTime) -> SensorReading {
        let wobble = (id % 7) as f64;
        SensorReading {
            id,
            created_at,
            particle: 1800.0 + wobble * 40.0,
            pm25: 12.0 + wobble,
            hcho: 20.0 + wobble * 0.5,
            co2: 620.0 + wobble * 15.0,
            temperature: 21.5 + wobble * 0.1,
            humidity: 44.0 + wobble * 0.3,
            voc: 140.0 + wobble * 5.0,
            sequence_num: id as i64,
            is_valid: true,
        }
    }

    /// `count` readings five minutes apart, newest first as the service
    /// sends them.
    pub fn sample_history(count: u64) -> Vec<SensorReading> {
        let newest = anchor();
        (0..count)
            .map(|i| {
                let id = count - i;
                sample_reading(id, newest - Duration::minutes(5 * i as i64))
            })
            .collect()
    }

    fn channel(min: f64, median: f64, avg: f64, max: f64, count: u64) -> ChannelStats {
        ChannelStats {
            min,
            max,
            avg,
            median,
            std_dev: (max - min) / 4.0,
            count,
        }
    }

    /// A valid stats snapshot over `hours`.
    pub fn sample_stats(hours: u32) -> StatsSnapshot {
        let end_time = anchor();
        StatsSnapshot {
            hours,
            count: 288,
            start_time: end_time - Duration::hours(i64::from(hours)),
            end_time,
            stats: ChannelStatsSet {
                particle: channel(900.0, 1800.0, 1850.0, 3200.0, 288),
                pm25: channel(4.0, 12.0, 14.5, 48.0, 288),
                hcho: channel(10.0, 21.0, 22.0, 40.0, 288),
                co2: channel(420.0, 640.0, 700.0, 1250.0, 288),
                temperature: channel(19.5, 21.6, 21.7, 24.3, 288),
                humidity: channel(38.0, 44.0, 44.5, 52.0, 288),
                voc: channel(90.0, 150.0, 160.0, 320.0, 288),
            },
            anomalies: vec![Anomaly {
                kind: "co2".to_string(),
                value: Some(1250.0),
                threshold: Some(1000.0),
                level: Severity::Warning,
                message: "CO2 above 1000 ppm".to_string(),
            }],
        }
    }

    /// A valid analysis snapshot over `hours`.
    pub fn sample_analysis(hours: u32) -> AnalysisSnapshot {
        let hourly_trend = (8..18)
            .map(|hour| HourlyTrend {
                hour,
                pm25: 10.0 + f64::from(hour),
                co2: 500.0 + f64::from(hour) * 30.0,
                hcho: 20.0,
                voc: 150.0,
                temperature: 21.0,
                humidity: 45.0,
                count: 12,
            })
            .collect();

        let mut correlations = BTreeMap::new();
        correlations.insert("temp_hcho".to_string(), 0.62);
        correlations.insert("humidity_voc".to_string(), -0.18);
        correlations.insert("pm25_particle".to_string(), 0.91);
        correlations.insert("co2_voc".to_string(), 0.44);

        AnalysisSnapshot {
            hours,
            correlations,
            hourly_trend,
            peak_hours: PeakHours {
                pm25: PeakHour {
                    hour: 17,
                    value: 27.0,
                },
                co2: PeakHour {
                    hour: 17,
                    value: 1010.0,
                },
            },
            aqi: AqiRecord {
                pm25_aqi: 51.0,
                pm25_level: "good".to_string(),
                co2_level: "fair".to_string(),
                voc_level: "good".to_string(),
                overall_score: 82.0,
                overall_level: "good".to_string(),
            },
            suggestions: vec![Suggestion {
                kind: "co2".to_string(),
                icon: "ventilation".to_string(),
                message: "Open a window in the late afternoon".to_string(),
            }],
            latest: sample_reading(12, anchor()),
        }
    }
}
