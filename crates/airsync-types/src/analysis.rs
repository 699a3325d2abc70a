//! Derived analysis returned by `GET /analysis`.
//!
//! Every value here is computed by the service. Clients pass them through
//! unchanged; nothing in this crate recomputes correlations, trends or the
//! air-quality index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ContractError, ContractResult};
use crate::stats::EmptyWindow;
use crate::types::SensorReading;

/// Channel averages for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTrend {
    /// Hour of day, `0..24`.
    pub hour: u8,
    pub pm25: f64,
    pub co2: f64,
    pub hcho: f64,
    pub voc: f64,
    pub temperature: f64,
    pub humidity: f64,
    /// Samples aggregated into this hour.
    pub count: u64,
}

/// The hour with the highest hourly average for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakHour {
    pub hour: u8,
    pub value: f64,
}

/// Peak-hour markers for PM2.5 and CO₂.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakHours {
    pub pm25: PeakHour,
    pub co2: PeakHour,
}

/// Air-quality index derived from the latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiRecord {
    pub pm25_aqi: f64,
    pub pm25_level: String,
    pub co2_level: String,
    pub voc_level: String,
    /// Composite score, 0-100.
    pub overall_score: f64,
    pub overall_level: String,
}

/// An actionable hint for the occupant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
    pub message: String,
}

/// Correlations, trends and AQI over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    /// Window size in hours.
    pub hours: u32,
    /// Pearson coefficient keyed by channel pair, e.g. `temp_hcho`.
    #[serde(default)]
    pub correlations: BTreeMap<String, f64>,
    /// Hourly aggregates ordered by hour of day.
    #[serde(default)]
    pub hourly_trend: Vec<HourlyTrend>,
    pub peak_hours: PeakHours,
    pub aqi: AqiRecord,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// The reading the analysis was anchored on.
    pub latest: SensorReading,
}

impl AnalysisSnapshot {
    /// Look up a correlation coefficient by its pair key.
    #[must_use]
    pub fn correlation(&self, pair: &str) -> Option<f64> {
        self.correlations.get(pair).copied()
    }

    /// Check that every hour value is a real hour of the day.
    pub fn validate(&self) -> ContractResult<()> {
        let hours = self
            .hourly_trend
            .iter()
            .map(|t| t.hour)
            .chain([self.peak_hours.pm25.hour, self.peak_hours.co2.hour]);
        for hour in hours {
            if hour >= 24 {
                return Err(ContractError::InvalidHour(hour));
            }
        }
        Ok(())
    }
}

/// Body of `GET /analysis`: a snapshot, or an empty-window notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Snapshot(Box<AnalysisSnapshot>),
    Empty(EmptyWindow),
}
