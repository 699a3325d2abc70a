//! Windowed statistics returned by `GET /stats`.

use core::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ContractError, ContractResult};
use crate::types::Channel;

/// Slack allowed in the ordering checks. The service rounds each field to
/// two decimals on its own, so a constant window can report an `avg` one
/// rounding step outside `min`/`max`.
pub const ROUNDING_TOLERANCE: f64 = 0.01 + 1e-7;

/// Summary statistics for one channel over a window.
///
/// When `count == 0` the remaining fields are zero by convention and mean
/// "no data", not a real zero reading. Use [`has_data`](Self::has_data)
/// before displaying them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub std_dev: f64,
    pub count: u64,
}

impl ChannelStats {
    /// Whether the window contained any samples for this channel.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.count > 0
    }

    /// Check `min <= median <= max` and `min <= avg <= max`, up to
    /// [`ROUNDING_TOLERANCE`].
    ///
    /// Empty stats always pass. NaN values never satisfy the ordering and
    /// are reported as a violation.
    pub fn validate(&self, channel: Channel) -> ContractResult<()> {
        if !self.has_data() {
            return Ok(());
        }

        let le = |a: f64, b: f64| a - b <= ROUNDING_TOLERANCE;
        let ordered = le(self.min, self.median)
            && le(self.median, self.max)
            && le(self.min, self.avg)
            && le(self.avg, self.max);

        if ordered {
            Ok(())
        } else {
            Err(ContractError::UnorderedStats {
                channel,
                min: self.min,
                median: self.median,
                avg: self.avg,
                max: self.max,
            })
        }
    }
}

/// Per-channel statistics, keyed the way the service sends them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelStatsSet {
    pub particle: ChannelStats,
    pub pm25: ChannelStats,
    pub hcho: ChannelStats,
    pub co2: ChannelStats,
    pub temperature: ChannelStats,
    pub humidity: ChannelStats,
    pub voc: ChannelStats,
}

impl ChannelStatsSet {
    /// Statistics for a single channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> &ChannelStats {
        match channel {
            Channel::Particle => &self.particle,
            Channel::Pm25 => &self.pm25,
            Channel::Hcho => &self.hcho,
            Channel::Co2 => &self.co2,
            Channel::Temperature => &self.temperature,
            Channel::Humidity => &self.humidity,
            Channel::Voc => &self.voc,
        }
    }

    /// Iterate `(channel, stats)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &ChannelStats)> + '_ {
        Channel::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Severity of an anomaly raised by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Danger,
    /// Any level this client does not know about.
    #[serde(other)]
    Other,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Danger => write!(f, "danger"),
            Severity::Other => write!(f, "other"),
        }
    }
}

/// A threshold breach or sensor fault detected on the latest sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// What was checked, e.g. `pm25`, `co2` or `sensor`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Offending value, absent for sensor faults.
    #[serde(default)]
    pub value: Option<f64>,
    /// Threshold that was crossed.
    #[serde(default)]
    pub threshold: Option<f64>,
    pub level: Severity,
    pub message: String,
}

/// Statistics over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Window size in hours.
    pub hours: u32,
    /// Number of samples in the window.
    pub count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub stats: ChannelStatsSet,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
}

impl StatsSnapshot {
    /// Check the window bounds and every channel's ordering invariant.
    pub fn validate(&self) -> ContractResult<()> {
        if self.start_time > self.end_time {
            return Err(ContractError::InvertedWindow {
                start: self.start_time,
                end: self.end_time,
            });
        }
        for (channel, stats) in self.stats.iter() {
            stats.validate(channel)?;
        }
        Ok(())
    }

    /// Highest anomaly severity, if any anomaly was raised.
    #[must_use]
    pub fn worst_severity(&self) -> Option<Severity> {
        self.anomalies
            .iter()
            .map(|a| a.level)
            .max_by_key(|level| match level {
                Severity::Other => 0,
                Severity::Warning => 1,
                Severity::Danger => 2,
            })
    }
}

/// Answer sent instead of a snapshot when the window holds no samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyWindow {
    pub message: String,
    #[serde(default)]
    pub hours: Option<u32>,
}

/// Body of `GET /stats`: a snapshot, or an empty-window notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatsPayload {
    Snapshot(StatsSnapshot),
    Empty(EmptyWindow),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }

    /// Summarize samples the way the service does (population std-dev,
    /// values rounded to two decimals).
    fn summarize(values: &[f64]) -> ChannelStats {
        if values.is_empty() {
            return ChannelStats::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        let avg = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let variance = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / n as f64;
        ChannelStats {
            min: round2(sorted[0]),
            max: round2(sorted[n - 1]),
            avg: round2(avg),
            median: round2(median),
            std_dev: round2(variance.sqrt()),
            count: n as u64,
        }
    }

    const STATS_JSON: &str = r#"{
        "hours": 24,
        "count": 3,
        "start_time": "2025-01-14T15:00:00.5+08:00",
        "end_time": "2025-01-15T15:00:00.5+08:00",
        "stats": {
            "particle": {"min": 900, "max": 1500, "avg": 1200, "median": 1200, "std_dev": 244.95, "count": 3},
            "pm25": {"min": 10, "max": 90, "avg": 40, "median": 20, "std_dev": 35.59, "count": 3},
            "hcho": {"min": 20, "max": 30, "avg": 25, "median": 25, "std_dev": 4.08, "count": 3},
            "co2": {"min": 500, "max": 1200, "avg": 800, "median": 700, "std_dev": 294.39, "count": 3},
            "temperature": {"min": 21, "max": 23, "avg": 22, "median": 22, "std_dev": 0.82, "count": 3},
            "humidity": {"min": 40, "max": 50, "avg": 45, "median": 45, "std_dev": 4.08, "count": 3},
            "voc": {"min": 100, "max": 300, "avg": 200, "median": 200, "std_dev": 81.65, "count": 3}
        },
        "anomalies": [
            {"type": "pm25", "value": 90, "threshold": 75, "level": "warning", "message": "PM2.5 above limit"},
            {"type": "sensor", "level": "danger", "message": "sensor may be faulty"}
        ]
    }"#;

    #[test]
    fn test_stats_snapshot_from_service_json() {
        let snapshot: StatsSnapshot = serde_json::from_str(STATS_JSON).unwrap();
        assert_eq!(snapshot.hours, 24);
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.stats.get(Channel::Co2).median, 700.0);
        assert_eq!(snapshot.anomalies.len(), 2);
        assert_eq!(snapshot.anomalies[0].kind, "pm25");
        assert_eq!(snapshot.anomalies[0].threshold, Some(75.0));
        assert!(snapshot.anomalies[1].value.is_none());
        assert_eq!(snapshot.worst_severity(), Some(Severity::Danger));
        snapshot.validate().unwrap();
    }

    #[test]
    fn test_stats_payload_variants() {
        let payload: StatsPayload = serde_json::from_str(STATS_JSON).unwrap();
        assert!(matches!(payload, StatsPayload::Snapshot(_)));

        let payload: StatsPayload =
            serde_json::from_str(r#"{"message": "no data", "hours": 6}"#).unwrap();
        match payload {
            StatsPayload::Empty(empty) => assert_eq!(empty.hours, Some(6)),
            other => panic!("expected empty window, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_severity_is_preserved_as_other() {
        let anomaly: Anomaly =
            serde_json::from_str(r#"{"type": "voc", "level": "notice", "message": "m"}"#).unwrap();
        assert_eq!(anomaly.level, Severity::Other);
    }

    #[test]
    fn test_empty_channel_stats_are_not_data() {
        let stats = ChannelStats::default();
        assert!(!stats.has_data());
        assert!(stats.validate(Channel::Pm25).is_ok());
    }

    #[test]
    fn test_unordered_stats_rejected() {
        let stats = ChannelStats {
            min: 10.0,
            max: 20.0,
            avg: 25.0,
            median: 15.0,
            std_dev: 1.0,
            count: 4,
        };
        let err = stats.validate(Channel::Co2).unwrap_err();
        assert!(matches!(
            err,
            ContractError::UnorderedStats {
                channel: Channel::Co2,
                ..
            }
        ));
        assert!(err.to_string().starts_with("co2 stats out of order"));
    }

    #[test]
    fn test_constant_window_rounding_is_accepted() {
        // Six samples of 0.045: each field rounded on its own
        let stats = ChannelStats {
            min: 0.05,
            max: 0.05,
            avg: 0.04,
            median: 0.05,
            std_dev: 0.0,
            count: 6,
        };
        assert!(stats.validate(Channel::Hcho).is_ok());

        let high = ChannelStats {
            min: 5000.0,
            max: 5000.0,
            avg: 5000.01,
            median: 5000.0,
            std_dev: 0.0,
            count: 3,
        };
        assert!(high.validate(Channel::Particle).is_ok());

        let beyond = ChannelStats { avg: 0.03, ..stats };
        assert!(beyond.validate(Channel::Hcho).is_err());
    }

    #[test]
    fn test_nan_stats_rejected() {
        let stats = ChannelStats {
            min: 0.0,
            max: 1.0,
            avg: f64::NAN,
            median: 0.5,
            std_dev: 0.0,
            count: 1,
        };
        assert!(stats.validate(Channel::Voc).is_err());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut snapshot: StatsSnapshot = serde_json::from_str(STATS_JSON).unwrap();
        std::mem::swap(&mut snapshot.start_time, &mut snapshot.end_time);
        assert!(matches!(
            snapshot.validate(),
            Err(ContractError::InvertedWindow { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_summarized_stats_are_ordered(
            values in prop::collection::vec(-5000.0f64..5000.0, 1..200)
        ) {
            let stats = summarize(&values);
            prop_assert!(stats.has_data());
            prop_assert!(stats.validate(Channel::Pm25).is_ok());
            prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
            prop_assert!(stats.min <= stats.avg && stats.avg <= stats.max);
        }
    }
}
