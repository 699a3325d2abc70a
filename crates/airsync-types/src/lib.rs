//! Response contracts for the airsync telemetry service.
//!
//! This crate holds the typed shapes of the four remote resources a sync
//! client reads, together with the invariants each one carries:
//!
//! | Endpoint | Type |
//! |----------|------|
//! | `GET /status` | [`StatusResponse`] |
//! | `GET /history?hours=N` | [`HistoryBatch`] |
//! | `GET /stats?hours=N` | [`StatsPayload`] / [`StatsSnapshot`] |
//! | `GET /analysis?hours=N` | [`AnalysisPayload`] / [`AnalysisSnapshot`] |
//!
//! All types are immutable snapshots. They are decoded, validated and
//! stored whole; nothing mutates them field by field.
//!
//! # Example
//!
//! ```
//! use airsync_types::{Channel, StatsPayload};
//!
//! let body = r#"{"message": "no data", "hours": 24}"#;
//! let payload: StatsPayload = serde_json::from_str(body).unwrap();
//! assert!(matches!(payload, StatsPayload::Empty(_)));
//! assert_eq!(Channel::Pm25.unit(), "µg/m³");
//! ```

pub mod analysis;
pub mod error;
pub mod stats;
pub mod types;

pub use analysis::{
    AnalysisPayload, AnalysisSnapshot, AqiRecord, HourlyTrend, PeakHour, PeakHours, Suggestion,
};
pub use error::{ContractError, ContractResult};
pub use stats::{
    Anomaly, ChannelStats, ChannelStatsSet, EmptyWindow, ROUNDING_TOLERANCE, Severity,
    StatsPayload, StatsSnapshot,
};
pub use types::{Channel, HistoryBatch, SensorReading, StatusResponse};

/// Window used by history, stats and analysis when none is given.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;
