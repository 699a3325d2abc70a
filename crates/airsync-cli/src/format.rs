//! Output formatting for text and JSON output.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use airsync_core::{BatchReport, FetchOutcome, Resource, SyncState};
use airsync_types::{AnalysisSnapshot, Channel, SensorReading, StatsSnapshot};

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS` in its own offset.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

fn channel_line(channel: Channel, value: f64, opts: &FormatOptions) -> String {
    format!(
        "  {:<18} {} {}\n",
        channel.label(),
        style::format_channel_colored(channel, value, opts.no_color),
        channel.unit()
    )
}

/// Format a reading as a multi-line block.
pub fn format_reading_text(reading: &SensorReading, opts: &FormatOptions) -> String {
    let mut out = format!(
        "{}\n",
        style::format_header(
            &format!(
                "Reading #{} at {}",
                reading.id,
                format_timestamp(reading.created_at)
            ),
            opts.no_color
        )
    );
    for channel in Channel::ALL {
        out.push_str(&channel_line(channel, reading.value(channel), opts));
    }
    if reading.is_suspect() {
        let _ = writeln!(
            out,
            "  {}",
            style::format_warning(
                &format!("sequence {} did not advance", reading.sequence_num),
                opts.no_color
            )
        );
    }
    out
}

/// Format a single reading as one line, used by `history` and `watch`.
pub fn format_reading_line(reading: &SensorReading, opts: &FormatOptions) -> String {
    let value = |channel| style::format_channel_colored(channel, reading.value(channel), opts.no_color);
    format!(
        "{}  CO₂ {} ppm  PM2.5 {}  HCHO {}  VOC {}  {}°C  {}%{}\n",
        format_timestamp(reading.created_at),
        value(Channel::Co2),
        value(Channel::Pm25),
        value(Channel::Hcho),
        value(Channel::Voc),
        value(Channel::Temperature),
        value(Channel::Humidity),
        if reading.is_suspect() { "  (suspect)" } else { "" }
    )
}

/// Format readings, oldest first, one per line.
pub fn format_history_text(readings: &[SensorReading], opts: &FormatOptions) -> String {
    if readings.is_empty() {
        return "No readings in the window.\n".to_string();
    }
    let mut out = format!(
        "{}\n",
        style::format_header(&format!("{} readings", readings.len()), opts.no_color)
    );
    for reading in readings {
        out.push_str(&format_reading_line(reading, opts));
    }
    out
}

/// Format a statistics snapshot as a per-channel table plus anomalies.
pub fn format_stats_text(stats: &StatsSnapshot, opts: &FormatOptions) -> String {
    let mut out = format!(
        "{}\n",
        style::format_header(
            &format!(
                "Statistics over {}h ({} samples, {} to {})",
                stats.hours,
                stats.count,
                format_timestamp(stats.start_time),
                format_timestamp(stats.end_time)
            ),
            opts.no_color
        )
    );
    let _ = writeln!(
        out,
        "  {:<18} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Channel", "min", "avg", "median", "max", "std dev"
    );
    for (channel, channel_stats) in stats.stats.iter() {
        if !channel_stats.has_data() {
            let _ = writeln!(out, "  {:<18} {:>9}", channel.label(), "no data");
            continue;
        }
        let _ = writeln!(
            out,
            "  {:<18} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>9.2}",
            channel.label(),
            channel_stats.min,
            channel_stats.avg,
            channel_stats.median,
            channel_stats.max,
            channel_stats.std_dev
        );
    }

    if stats.anomalies.is_empty() {
        out.push_str("No anomalies.\n");
    } else {
        out.push_str("Anomalies:\n");
        for anomaly in &stats.anomalies {
            let _ = writeln!(
                out,
                "  {} {}",
                style::format_severity(anomaly.level, opts.no_color),
                anomaly.message
            );
        }
    }
    out
}

/// Format an analysis snapshot: AQI, peaks, correlations, hourly trend and
/// suggestions, as delivered by the service.
pub fn format_analysis_text(analysis: &AnalysisSnapshot, opts: &FormatOptions) -> String {
    let aqi = &analysis.aqi;
    let mut out = format!(
        "{}\n",
        style::format_header(
            &format!("Analysis over {}h", analysis.hours),
            opts.no_color
        )
    );
    let _ = writeln!(
        out,
        "  AQI {:.0} ({})  PM2.5 AQI {:.0} ({})  CO₂ {}  VOC {}",
        aqi.overall_score, aqi.overall_level, aqi.pm25_aqi, aqi.pm25_level, aqi.co2_level, aqi.voc_level
    );
    let _ = writeln!(
        out,
        "  Peak hours: PM2.5 {:02}:00 ({:.1}), CO₂ {:02}:00 ({:.0})",
        analysis.peak_hours.pm25.hour,
        analysis.peak_hours.pm25.value,
        analysis.peak_hours.co2.hour,
        analysis.peak_hours.co2.value
    );

    if !analysis.correlations.is_empty() {
        out.push_str("Correlations:\n");
        for (pair, coefficient) in &analysis.correlations {
            let _ = writeln!(
                out,
                "  {:<18} {}",
                pair,
                style::format_correlation(*coefficient, opts.no_color)
            );
        }
    }

    if !analysis.hourly_trend.is_empty() {
        out.push_str("Hourly trend:\n");
        for trend in &analysis.hourly_trend {
            let _ = writeln!(
                out,
                "  {:02}:00  PM2.5 {:>6.1}  CO₂ {:>5.0}  n={}",
                trend.hour, trend.pm25, trend.co2, trend.count
            );
        }
    }

    for suggestion in &analysis.suggestions {
        let _ = writeln!(out, "{} {}", suggestion.icon, suggestion.message);
    }
    out
}

/// Format the outcome of a full refresh, one line per resource.
pub fn format_report_text(report: &BatchReport, opts: &FormatOptions) -> String {
    let mut out = String::new();
    for (resource, outcome) in &report.outcomes {
        let line = format!("{:<9} {}", resource.to_string(), outcome);
        let styled = match outcome {
            FetchOutcome::Applied => style::format_success(&line, opts.no_color),
            FetchOutcome::Failed { .. } => style::format_error(&line, opts.no_color),
            FetchOutcome::Superseded | FetchOutcome::Suppressed => {
                style::format_warning(&line, opts.no_color)
            }
        };
        out.push_str(&styled);
        out.push('\n');
    }
    if let Some(error) = &report.error {
        out.push_str(&style::format_error(error, opts.no_color));
        out.push('\n');
    }
    let _ = writeln!(out, "{}/{} resources updated", report.applied(), report.outcomes.len());
    out
}

/// JSON view of a batch report.
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    pub outcomes: Vec<OutcomeJson<'a>>,
    pub error: Option<&'a str>,
    pub applied: usize,
}

#[derive(Debug, Serialize)]
pub struct OutcomeJson<'a> {
    pub resource: Resource,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

impl<'a> From<&'a BatchReport> for ReportJson<'a> {
    fn from(report: &'a BatchReport) -> Self {
        let outcomes = report
            .outcomes
            .iter()
            .map(|(resource, outcome)| {
                let (label, reason) = match outcome {
                    FetchOutcome::Applied => ("applied", None),
                    FetchOutcome::Failed { reason } => ("failed", Some(reason.as_str())),
                    FetchOutcome::Superseded => ("superseded", None),
                    FetchOutcome::Suppressed => ("suppressed", None),
                };
                OutcomeJson {
                    resource: *resource,
                    outcome: label,
                    reason,
                }
            })
            .collect();
        Self {
            outcomes,
            error: report.error.as_deref(),
            applied: report.applied(),
        }
    }
}

/// Format one state update for `watch`: latest reading, stats summary and
/// any stale resources.
pub fn format_watch_update(state: &SyncState, opts: &FormatOptions) -> String {
    let mut out = match &state.latest {
        Some(reading) => format_reading_line(reading, opts),
        None => "waiting for first reading\n".to_string(),
    };

    if let Some(stats) = &state.stats
        && let Some(severity) = stats.worst_severity()
    {
        let _ = writeln!(
            out,
            "  {} {} anomalies in the last {}h",
            style::format_severity(severity, opts.no_color),
            stats.anomalies.len(),
            stats.hours
        );
    }

    for resource in Resource::ALL {
        let health = state.health(resource);
        if health.is_stale() {
            let reason = health.last_error.as_deref().unwrap_or("unknown error");
            out.push_str("  ");
            out.push_str(&style::format_warning(
                &format!("{} is stale: {}", resource, reason),
                opts.no_color,
            ));
            out.push('\n');
        }
    }
    out
}
