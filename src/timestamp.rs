//! Log timestamp handling
//!
//! The infotainment logs use several timestamp layouts depending on the
//! subsystem that wrote the line. All of them are local wall-clock times
//! without an offset, so they are kept as `NaiveDateTime`.

use chrono::NaiveDateTime;

use crate::error::{AnalyzerError, Result};

// Navigation framework lines: 10/14/2025 08:15:02.417
const NAV_FORMAT: &str = "%m/%d/%Y %H:%M:%S%.f";
// Unified search lines: 2025-10-14 08:15:02
const SEARCH_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a timestamp in any of the known log layouts.
pub fn parse_log_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');

    [NAV_FORMAT, SEARCH_FORMAT, ISO_FORMAT]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| AnalyzerError::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Signed difference `to - from` in seconds, nanosecond resolution.
pub fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        // Spans beyond ~292 years overflow i64 nanoseconds
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}
