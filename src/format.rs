//! Display formatting helpers shared by every tab: clock labels for chart
//! axes, full date-times, human-readable durations, and byte magnitudes.

use chrono::{DateTime, Utc};

const BYTE_UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB", "PB"];

/// Convert epoch seconds (the wire representation) into a UTC instant.
/// Sub-second precision is dropped; out-of-range values clamp to the epoch.
pub fn instant(ts_secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts_secs as i64, 0).unwrap_or_else(|| DateTime::UNIX_EPOCH)
}

/// Short clock-time label used on chart axes, e.g. "14:03:27".
pub fn clock_time(ts_secs: f64) -> String {
    instant(ts_secs).format("%H:%M:%S").to_string()
}

/// Full date-time label used in tables, e.g. "2026-08-07 14:03:27".
pub fn date_time(ts_secs: f64) -> String {
    instant(ts_secs).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Human-readable duration from a second count.
///
/// Below a minute the output is in whole seconds, below an hour in whole
/// minutes, beyond that hours plus the minute remainder.
pub fn human_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < 60.0 {
        format!("{} seconds", seconds as u64)
    } else if seconds < 3_600.0 {
        format!("{} minutes", (seconds / 60.0) as u64)
    } else {
        let hours = (seconds / 3_600.0) as u64;
        let minutes = ((seconds % 3_600.0) / 60.0) as u64;
        format!("{hours} hours, {minutes} minutes")
    }
}

/// Byte magnitude with the largest unit that keeps the scaled value below
/// 1024, two decimals, trailing zeros trimmed.
pub fn bytes(value: f64) -> String {
    if value == 0.0 {
        return "0 Bytes".to_string();
    }
    let magnitude = value.abs();
    let mut unit = 0usize;
    let mut scaled = magnitude;
    while scaled >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let formatted = format!("{scaled:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{sign}{trimmed} {}", BYTE_UNITS[unit])
}

/// Format a raw metric value for the metric table based on its name.
pub fn metric_value(name: &str, value: f64) -> String {
    if name.contains("percent") {
        format!("{value:.2}%")
    } else if name.contains("bytes") {
        bytes(value)
    } else if name.contains("seconds") || name.contains("duration") {
        format!("{value:.4}s")
    } else {
        format!("{value:.2}")
    }
}
