//! Core types for sensor telemetry.

use core::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single measured quantity reported by the sensor.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new channels
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Channel {
    /// Particles larger than 0.3 µm.
    Particle,
    /// Fine particulate matter (PM2.5).
    Pm25,
    /// Formaldehyde.
    Hcho,
    /// Carbon dioxide.
    Co2,
    /// Air temperature.
    Temperature,
    /// Relative humidity.
    Humidity,
    /// Volatile organic compounds.
    Voc,
}

impl Channel {
    /// Every monitored channel, in wire order.
    pub const ALL: [Channel; 7] = [
        Channel::Particle,
        Channel::Pm25,
        Channel::Hcho,
        Channel::Co2,
        Channel::Temperature,
        Channel::Humidity,
        Channel::Voc,
    ];

    /// The JSON key used for this channel.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Particle => "particle",
            Channel::Pm25 => "pm25",
            Channel::Hcho => "hcho",
            Channel::Co2 => "co2",
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Voc => "voc",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Particle => "Particles >0.3µm",
            Channel::Pm25 => "PM2.5",
            Channel::Hcho => "HCHO",
            Channel::Co2 => "CO₂",
            Channel::Temperature => "Temperature",
            Channel::Humidity => "Humidity",
            Channel::Voc => "VOC",
        }
    }

    /// Measurement unit as reported by the service.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Particle => "pcs/0.1L",
            Channel::Pm25 | Channel::Hcho => "µg/m³",
            Channel::Co2 => "ppm",
            Channel::Temperature => "°C",
            Channel::Humidity => "%",
            Channel::Voc => "ppb",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One sample as stored by the aggregation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Service-assigned row identifier.
    pub id: u64,
    /// When the service received the sample.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Particles >0.3µm (pcs/0.1L).
    pub particle: f64,
    /// PM2.5 (µg/m³).
    pub pm25: f64,
    /// Formaldehyde (µg/m³).
    pub hcho: f64,
    /// CO₂ (ppm).
    pub co2: f64,
    /// Temperature (°C).
    pub temperature: f64,
    /// Relative humidity (%).
    pub humidity: f64,
    /// VOC (ppb).
    pub voc: f64,
    /// Device counter; unique and non-decreasing across a history sequence.
    pub sequence_num: i64,
    /// `false` when the device counter did not advance, which usually
    /// means the sensor restarted or is misbehaving.
    pub is_valid: bool,
}

impl SensorReading {
    /// Value of a single channel.
    #[must_use]
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Particle => self.particle,
            Channel::Pm25 => self.pm25,
            Channel::Hcho => self.hcho,
            Channel::Co2 => self.co2,
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Voc => self.voc,
        }
    }

    /// Readings flagged invalid are kept but should not be trusted.
    #[must_use]
    pub fn is_suspect(&self) -> bool {
        !self.is_valid
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Most recent sample.
    pub last_data: SensorReading,
    /// Service-side health label for the sensor.
    #[serde(default)]
    pub sensor_status: Option<String>,
    /// Sequence number of the most recent sample.
    #[serde(default)]
    pub last_sequence: Option<i64>,
}

/// Body of `GET /history`. The service returns readings newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBatch {
    pub count: usize,
    pub data: Vec<SensorReading>,
}

impl HistoryBatch {
    /// Consume the batch and return readings in ascending time order.
    ///
    /// The wire order is reversed first (the service sends newest first) and
    /// then stably sorted by `created_at`, so the result is ascending even if
    /// the service order was not strictly descending.
    #[must_use]
    pub fn into_chronological(self) -> Vec<SensorReading> {
        let mut data = self.data;
        data.reverse();
        data.sort_by_key(|r| r.created_at);
        data
    }

    /// Whether `count` agrees with the number of readings carried.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.count == self.data.len()
    }
}
