//! Color thresholds and styled value helpers.

use owo_colors::OwoColorize;

use airsync_types::{Channel, Severity};

/// CO₂ thresholds (ppm).
pub mod co2 {
    pub const GOOD: f64 = 800.0; // Green: < 800 ppm
    pub const MODERATE: f64 = 1000.0; // Yellow: 800-1000 ppm
    pub const POOR: f64 = 1500.0; // Orange: 1000-1500 ppm
    // Red: > 1500 ppm
}

/// PM2.5 thresholds (µg/m³), following the EPA AQI breakpoints.
pub mod pm25 {
    pub const GOOD: f64 = 12.0;
    pub const MODERATE: f64 = 35.4;
    pub const POOR: f64 = 55.4;
}

/// Formaldehyde thresholds (µg/m³).
pub mod hcho {
    pub const GOOD: f64 = 30.0;
    pub const MODERATE: f64 = 60.0;
    pub const POOR: f64 = 100.0;
}

/// VOC thresholds (ppb).
pub mod voc {
    pub const GOOD: f64 = 220.0;
    pub const MODERATE: f64 = 660.0;
    pub const POOR: f64 = 2200.0;
}

/// Humidity thresholds (percentage) for comfort.
pub mod humidity {
    pub const LOW: f64 = 30.0; // Yellow: < 30% (too dry)
    pub const HIGH: f64 = 70.0; // Yellow: > 70% (too humid)
}

/// Temperature thresholds (Celsius) for comfort.
pub mod temperature {
    pub const COLD: f64 = 18.0; // Cyan: < 18°C
    pub const WARM: f64 = 26.0; // Orange: > 26°C
}

/// Air-quality band for a pollutant value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Good,
    Moderate,
    Poor,
    Bad,
}

fn band(value: f64, good: f64, moderate: f64, poor: f64) -> Band {
    if value < good {
        Band::Good
    } else if value < moderate {
        Band::Moderate
    } else if value < poor {
        Band::Poor
    } else {
        Band::Bad
    }
}

/// Band for a pollutant channel. Comfort channels and particle counts have
/// no band.
pub fn pollutant_band(channel: Channel, value: f64) -> Option<Band> {
    match channel {
        Channel::Co2 => Some(band(value, co2::GOOD, co2::MODERATE, co2::POOR)),
        Channel::Pm25 => Some(band(value, pm25::GOOD, pm25::MODERATE, pm25::POOR)),
        Channel::Hcho => Some(band(value, hcho::GOOD, hcho::MODERATE, hcho::POOR)),
        Channel::Voc => Some(band(value, voc::GOOD, voc::MODERATE, voc::POOR)),
        _ => None,
    }
}

fn paint_band(text: String, band: Band) -> String {
    match band {
        Band::Good => format!("{}", text.green()),
        Band::Moderate => format!("{}", text.yellow()),
        // Orange color (RGB: 255, 165, 0)
        Band::Poor => format!("{}", text.truecolor(255, 165, 0)),
        Band::Bad => format!("{}", text.red()),
    }
}

/// Format a channel value with its usual precision and color.
pub fn format_channel_colored(channel: Channel, value: f64, no_color: bool) -> String {
    let text = match channel {
        Channel::Particle | Channel::Co2 => format!("{:.0}", value),
        _ => format!("{:.1}", value),
    };

    if no_color {
        return text;
    }

    if let Some(band) = pollutant_band(channel, value) {
        return paint_band(text, band);
    }

    match channel {
        Channel::Temperature if value < temperature::COLD => format!("{}", text.cyan()),
        Channel::Temperature if value > temperature::WARM => {
            format!("{}", text.truecolor(255, 165, 0))
        }
        Channel::Humidity if !(humidity::LOW..=humidity::HIGH).contains(&value) => {
            format!("{}", text.yellow())
        }
        Channel::Temperature | Channel::Humidity => format!("{}", text.green()),
        _ => text,
    }
}

/// Format an anomaly severity label.
pub fn format_severity(severity: Severity, no_color: bool) -> String {
    let label = severity.to_string().to_uppercase();
    if no_color {
        return label;
    }
    match severity {
        Severity::Danger => format!("{}", label.red().bold()),
        Severity::Warning => format!("{}", label.yellow()),
        Severity::Other => format!("{}", label.dimmed()),
    }
}

/// Format a correlation coefficient, highlighting strong ones.
pub fn format_correlation(coefficient: f64, no_color: bool) -> String {
    let text = format!("{:+.2}", coefficient);
    if no_color || coefficient.abs() < 0.5 {
        text
    } else {
        format!("{}", text.bold())
    }
}

/// Format a section header.
pub fn format_header(title: &str, no_color: bool) -> String {
    if no_color {
        title.to_string()
    } else {
        format!("{}", title.bold())
    }
}

/// Format a success marker.
pub fn format_success(msg: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", msg)
    } else {
        format!("{} {}", "✓".green(), msg)
    }
}

/// Format a warning marker.
pub fn format_warning(msg: &str, no_color: bool) -> String {
    if no_color {
        format!("[WARN] {}", msg)
    } else {
        format!("{} {}", "!".yellow(), msg)
    }
}

/// Format an error marker.
pub fn format_error(msg: &str, no_color: bool) -> String {
    if no_color {
        format!("[FAIL] {}", msg)
    } else {
        format!("{} {}", "✗".red(), msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_co2_bands() {
        assert_eq!(pollutant_band(Channel::Co2, 450.0), Some(Band::Good));
        assert_eq!(pollutant_band(Channel::Co2, 800.0), Some(Band::Moderate));
        assert_eq!(pollutant_band(Channel::Co2, 1200.0), Some(Band::Poor));
        assert_eq!(pollutant_band(Channel::Co2, 1500.0), Some(Band::Bad));
    }

    #[test]
    fn test_comfort_channels_have_no_band() {
        assert_eq!(pollutant_band(Channel::Temperature, 40.0), None);
        assert_eq!(pollutant_band(Channel::Humidity, 90.0), None);
        assert_eq!(pollutant_band(Channel::Particle, 9000.0), None);
    }

    #[test]
    fn test_no_color_is_plain() {
        assert_eq!(format_channel_colored(Channel::Co2, 612.4, true), "612");
        assert_eq!(format_channel_colored(Channel::Pm25, 8.31, true), "8.3");
        assert_eq!(format_severity(Severity::Danger, true), "DANGER");
        assert_eq!(format_correlation(0.62, true), "+0.62");
        assert_eq!(format_success("done", true), "[OK] done");
        assert_eq!(format_error("boom", true), "[FAIL] boom");
    }

    #[test]
    fn test_colored_output_contains_value() {
        let colored = format_channel_colored(Channel::Co2, 1700.0, false);
        assert!(colored.contains("1700"));
        assert_ne!(colored, "1700");
    }
}
