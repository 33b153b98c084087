//! Per-file event streams.
//!
//! Upstream extraction turns each interesting log line into an
//! [`EventRecord`]. A stream validates those records one at a time, so a
//! single malformed line costs one event rather than the whole file, and
//! keeps the survivors in line order.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::decoder::{decode_fix, DecodeStats, Precision};
use crate::error::{AnalyzerError, Result};
use crate::model::{
    is_valid_bssid, Event, GpsFix, RawCoordinate, RawGpsSample, TelemetrySample, Timestamped,
    WifiSighting,
};
use crate::timestamp::parse_log_timestamp;

/// Flat, loosely typed record as produced by line extraction.
///
/// Only the columns relevant to `kind` need to be filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: String,
    pub timestamp: String,
    pub line: usize,
    #[serde(default)]
    pub raw_lon: Option<f64>,
    #[serde(default)]
    pub raw_lat: Option<f64>,
    #[serde(default)]
    pub precision: Option<Precision>,
    #[serde(default)]
    pub altitude_m: Option<f64>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub satellites: Option<u32>,
    #[serde(default)]
    pub bssid: Option<String>,
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub signal: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

fn finite(field: &str, value: f64, line: usize) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalyzerError::invalid(line, format!("{field} is not finite ({value})")))
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = AnalyzerError;

    fn try_from(record: EventRecord) -> Result<Self> {
        let line = record.line;
        let timestamp = parse_log_timestamp(&record.timestamp)?;

        match record.kind.trim().to_ascii_lowercase().as_str() {
            "gps" => {
                let raw_lon = record.raw_lon.ok_or(AnalyzerError::missing("raw_lon", line))?;
                let raw_lat = record.raw_lat.ok_or(AnalyzerError::missing("raw_lat", line))?;
                let altitude_m = finite(
                    "altitude_m",
                    record.altitude_m.ok_or(AnalyzerError::missing("altitude_m", line))?,
                    line,
                )?;
                let heading_deg = finite(
                    "heading_deg",
                    record.heading_deg.ok_or(AnalyzerError::missing("heading_deg", line))?,
                    line,
                )?;
                Ok(Event::Gps(RawGpsSample {
                    timestamp,
                    raw: RawCoordinate {
                        raw_lon,
                        raw_lat,
                        precision: record.precision,
                    },
                    altitude_m,
                    heading_deg,
                    // Lines without a SatInView field report zero
                    satellite_count: record.satellites.unwrap_or(0),
                    source_line: line,
                }))
            }
            "wifi" => {
                let bssid = record.bssid.ok_or(AnalyzerError::missing("bssid", line))?;
                if !is_valid_bssid(bssid.trim()) {
                    return Err(AnalyzerError::invalid(
                        line,
                        format!("malformed bssid {bssid:?}"),
                    ));
                }
                Ok(Event::Wifi(WifiSighting {
                    timestamp,
                    bssid: bssid.trim().to_ascii_lowercase(),
                    ssid: record.ssid.filter(|s| !s.trim().is_empty()),
                    signal_strength: record.signal.ok_or(AnalyzerError::missing("signal", line))?,
                    source_line: line,
                }))
            }
            "telemetry" => Ok(Event::Telemetry(TelemetrySample {
                timestamp,
                name: record
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .ok_or(AnalyzerError::missing("name", line))?,
                value: record.value.ok_or(AnalyzerError::missing("value", line))?,
                source_line: line,
            })),
            other => Err(AnalyzerError::invalid(
                line,
                format!("unknown event kind {other:?}"),
            )),
        }
    }
}

/// Typed events from one log file, ordered by source line.
#[derive(Debug, Clone, Default)]
pub struct EventStream {
    source_file: String,
    events: Vec<Event>,
    rejected: usize,
}

impl EventStream {
    /// Build a stream from already typed events. Sorting is stable, so
    /// events sharing a line keep their given order.
    pub fn new(source_file: impl Into<String>, mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.source_line());
        Self {
            source_file: source_file.into(),
            events,
            rejected: 0,
        }
    }

    /// Validate raw records, dropping and counting any that break their contract.
    pub fn from_records<I>(source_file: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = EventRecord>,
    {
        let source_file = source_file.into();
        let mut events = Vec::new();
        let mut rejected = 0;

        for record in records {
            match Event::try_from(record) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("{}: skipping record: {}", source_file, e);
                    rejected += 1;
                }
            }
        }

        let mut stream = Self::new(source_file, events);
        stream.rejected = rejected;
        stream
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Records rejected while building the stream.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn gps_samples(&self) -> impl Iterator<Item = &RawGpsSample> {
        self.events.iter().filter_map(|e| match e {
            Event::Gps(s) => Some(s),
            _ => None,
        })
    }

    pub fn wifi_sightings(&self) -> impl Iterator<Item = &WifiSighting> {
        self.events.iter().filter_map(|e| match e {
            Event::Wifi(s) => Some(s),
            _ => None,
        })
    }

    pub fn telemetry(&self) -> impl Iterator<Item = &TelemetrySample> {
        self.events.iter().filter_map(|e| match e {
            Event::Telemetry(s) => Some(s),
            _ => None,
        })
    }

    /// Decode every GPS sample, keeping line order and counting drops.
    pub fn decode_fixes(&self) -> (Vec<GpsFix>, DecodeStats) {
        let mut stats = DecodeStats::default();
        let mut fixes = Vec::new();

        for sample in self.gps_samples() {
            let outcome = decode_fix(sample, &self.source_file);
            stats.record(&outcome);
            match outcome {
                Ok(fix) => fixes.push(fix),
                Err(reason) => debug!(
                    "{}:{}: dropped fix ({:?})",
                    self.source_file, sample.source_line, reason
                ),
            }
        }

        (fixes, stats)
    }
}
