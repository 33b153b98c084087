//! Core record types shared by every analysis stage.
//!
//! All of these are plain values: each stage owns what it produces and
//! hands it on by value or by shared reference.

use chrono::NaiveDateTime;
use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::decoder::Precision;

const FEET_PER_METER: f64 = 3.28084;

/// Label used for networks that do not broadcast an SSID.
pub const HIDDEN_SSID_LABEL: &str = "(Hidden Network)";

/// A decoded position in decimal degrees.
///
/// # Example
/// ```
/// use sync_geo_analyzer::GeoPoint;
/// let sydney = GeoPoint::new(-33.8568, 151.2153);
/// assert!(sydney.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

/// A decoded, validated GPS fix. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub timestamp: NaiveDateTime,
    pub point: GeoPoint,
    pub altitude_m: f64,
    /// Wrapped into `[0, 360)`.
    pub heading_deg: f64,
    pub satellite_count: u32,
    pub source_file: String,
    pub source_line: usize,
}

impl GpsFix {
    pub fn altitude_ft(&self) -> f64 {
        self.altitude_m * FEET_PER_METER
    }

    pub fn timed_point(&self) -> TimedPoint {
        TimedPoint {
            timestamp: self.timestamp,
            point: self.point,
        }
    }
}

/// Scaled coordinate pair as it appears in the navigation log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoordinate {
    pub raw_lon: f64,
    pub raw_lat: f64,
    /// Forces a divisor instead of choosing one from magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<Precision>,
}

impl RawCoordinate {
    pub const fn new(raw_lon: f64, raw_lat: f64) -> Self {
        Self {
            raw_lon,
            raw_lat,
            precision: None,
        }
    }

    pub const fn with_precision(raw_lon: f64, raw_lat: f64, precision: Precision) -> Self {
        Self {
            raw_lon,
            raw_lat,
            precision: Some(precision),
        }
    }
}

/// A GPS sample before coordinate decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGpsSample {
    pub timestamp: NaiveDateTime,
    pub raw: RawCoordinate,
    pub altitude_m: f64,
    pub heading_deg: f64,
    pub satellite_count: u32,
    pub source_line: usize,
}

/// A WiFi access point seen by the head unit's scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiSighting {
    pub timestamp: NaiveDateTime,
    /// Lower-case colon separated MAC, e.g. `a4:2b:b0:11:22:33`.
    pub bssid: String,
    /// `None` for hidden networks.
    pub ssid: Option<String>,
    pub signal_strength: i32,
    pub source_line: usize,
}

impl WifiSighting {
    pub fn is_hidden(&self) -> bool {
        self.ssid.is_none()
    }

    /// SSID for display, substituting a label for hidden networks.
    pub fn display_ssid(&self) -> &str {
        self.ssid.as_deref().unwrap_or(HIDDEN_SSID_LABEL)
    }
}

/// A named numeric vehicle signal (speed, gear, odometer...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub timestamp: NaiveDateTime,
    pub name: String,
    pub value: f64,
    pub source_line: usize,
}

/// One typed record produced by upstream line extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Gps(RawGpsSample),
    Wifi(WifiSighting),
    Telemetry(TelemetrySample),
}

/// A timestamped position, the unit of spatial clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPoint {
    pub timestamp: NaiveDateTime,
    pub point: GeoPoint,
}

impl TimedPoint {
    pub const fn new(timestamp: NaiveDateTime, point: GeoPoint) -> Self {
        Self { timestamp, point }
    }
}

/// Anything positioned in a log by time and line.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
    fn source_line(&self) -> usize;
}

impl Timestamped for GpsFix {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
    fn source_line(&self) -> usize {
        self.source_line
    }
}

impl Timestamped for RawGpsSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
    fn source_line(&self) -> usize {
        self.source_line
    }
}

impl Timestamped for WifiSighting {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
    fn source_line(&self) -> usize {
        self.source_line
    }
}

impl Timestamped for TelemetrySample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
    fn source_line(&self) -> usize {
        self.source_line
    }
}

impl Timestamped for Event {
    fn timestamp(&self) -> NaiveDateTime {
        match self {
            Event::Gps(e) => e.timestamp,
            Event::Wifi(e) => e.timestamp,
            Event::Telemetry(e) => e.timestamp,
        }
    }

    fn source_line(&self) -> usize {
        match self {
            Event::Gps(e) => e.source_line,
            Event::Wifi(e) => e.source_line,
            Event::Telemetry(e) => e.source_line,
        }
    }
}

/// Checks for a 48-bit MAC written as six colon separated hex octets.
pub fn is_valid_bssid(bssid: &str) -> bool {
    let octets: Vec<&str> = bssid.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}
