//! Coordinate decoding for map-matched navigation fixes
//!
//! The navigation framework writes longitude and latitude as scaled numbers
//! whose scale depends on fix mode. Large magnitudes carry five decimal
//! places, smaller ones four. Decoding is pure: callers keep the counts.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::model::{GeoPoint, GpsFix, RawCoordinate, RawGpsSample};

/// Magnitude above which the fine divisor applies.
const FINE_MAGNITUDE_THRESHOLD: f64 = 1_000_000.0;

/// Decoded points closer than this to (0, 0) on both axes are bad fixes.
const NULL_ISLAND_EPSILON: f64 = 0.001;

/// Scale of a raw coordinate component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Four implied decimal places.
    Coarse,
    /// Five implied decimal places.
    Fine,
}

impl Precision {
    pub const fn divisor(self) -> f64 {
        match self {
            Precision::Coarse => 10_000.0,
            Precision::Fine => 100_000.0,
        }
    }

    /// Choose the scale from the raw magnitude.
    pub fn for_magnitude(raw: f64) -> Self {
        if raw.abs() > FINE_MAGNITUDE_THRESHOLD {
            Precision::Fine
        } else {
            Precision::Coarse
        }
    }
}

/// Why a raw fix was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Raw pair is exactly (0, 0): the receiver had no fix.
    NullFix,
    /// Decoded point falls outside latitude/longitude ranges.
    OutOfRange,
    /// Decoded point lands within a hair of (0, 0).
    NearNullIsland,
}

/// Decode a single scaled component.
pub fn decode_component(raw: f64, hint: Option<Precision>) -> f64 {
    let precision = hint.unwrap_or_else(|| Precision::for_magnitude(raw));
    raw / precision.divisor()
}

/// Decode a raw pair into a validated point.
///
/// Rules are checked in order and the first failure wins.
pub fn decode_coordinate(raw: &RawCoordinate) -> Result<GeoPoint, Rejection> {
    if raw.raw_lon == 0.0 && raw.raw_lat == 0.0 {
        return Err(Rejection::NullFix);
    }

    let point = GeoPoint::new(
        decode_component(raw.raw_lat, raw.precision),
        decode_component(raw.raw_lon, raw.precision),
    );

    if !point.is_valid() {
        return Err(Rejection::OutOfRange);
    }

    if point.latitude.abs() < NULL_ISLAND_EPSILON && point.longitude.abs() < NULL_ISLAND_EPSILON {
        return Err(Rejection::NearNullIsland);
    }

    Ok(point)
}

/// Decode a full GPS sample into an immutable fix.
pub fn decode_fix(sample: &RawGpsSample, source_file: &str) -> Result<GpsFix, Rejection> {
    let point = decode_coordinate(&sample.raw)?;

    Ok(GpsFix {
        timestamp: sample.timestamp,
        point,
        altitude_m: sample.altitude_m,
        heading_deg: normalize_heading(sample.heading_deg),
        satellite_count: sample.satellite_count,
        source_file: source_file.to_string(),
        source_line: sample.source_line,
    })
}

/// Wrap a heading into `[0, 360)`.
pub fn normalize_heading(heading_deg: f64) -> f64 {
    let wrapped = heading_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Degrees/minutes/seconds to decimal degrees. Sign follows `degrees`.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let decimal = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if degrees < 0.0 {
        -decimal
    } else {
        decimal
    }
}

/// Lines seen versus fixes accepted, broken down by rejection reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub seen: usize,
    pub accepted: usize,
    pub null_fix: usize,
    pub out_of_range: usize,
    pub near_null_island: usize,
}

impl DecodeStats {
    pub fn record<T>(&mut self, outcome: &Result<T, Rejection>) {
        self.seen += 1;
        match outcome {
            Ok(_) => self.accepted += 1,
            Err(Rejection::NullFix) => self.null_fix += 1,
            Err(Rejection::OutOfRange) => self.out_of_range += 1,
            Err(Rejection::NearNullIsland) => self.near_null_island += 1,
        }
    }

    pub fn filtered(&self) -> usize {
        self.seen - self.accepted
    }
}

impl AddAssign for DecodeStats {
    fn add_assign(&mut self, other: Self) {
        self.seen += other.seen;
        self.accepted += other.accepted;
        self.null_fix += other.null_fix;
        self.out_of_range += other.out_of_range;
        self.near_null_island += other.near_null_island;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_precision_selection() {
        assert_eq!(Precision::for_magnitude(-8_312_345.0), Precision::Fine);
        assert_eq!(Precision::for_magnitude(1_000_000.0), Precision::Coarse);
        assert_eq!(Precision::for_magnitude(423_456.0), Precision::Coarse);
    }

    #[test]
    fn test_decodes_fine_and_coarse_components() {
        // Detroit, written with five implied decimals
        let p = decode_coordinate(&RawCoordinate::new(-8_304_580.0, 4_233_150.0)).unwrap();
        assert_relative_eq!(p.longitude, -83.0458, epsilon = 1e-9);
        assert_relative_eq!(p.latitude, 42.3315, epsilon = 1e-9);

        // Same spot, four implied decimals
        let p = decode_coordinate(&RawCoordinate::new(-830_458.0, 423_315.0)).unwrap();
        assert_relative_eq!(p.longitude, -83.0458, epsilon = 1e-9);
        assert_relative_eq!(p.latitude, 42.3315, epsilon = 1e-9);
    }

    #[test]
    fn test_hint_overrides_magnitude() {
        let raw = RawCoordinate::with_precision(-830_458.0, 423_315.0, Precision::Fine);
        let p = decode_coordinate(&raw).unwrap();
        assert_relative_eq!(p.latitude, 4.23315, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_null_fix() {
        assert_eq!(
            decode_coordinate(&RawCoordinate::new(0.0, 0.0)),
            Err(Rejection::NullFix)
        );
        let raw = RawCoordinate::with_precision(0.0, 0.0, Precision::Fine);
        assert_eq!(decode_coordinate(&raw), Err(Rejection::NullFix));
    }

    #[test]
    fn test_rejects_near_null_island_regardless_of_divisor() {
        // 5 / 10000 = 0.0005 on both axes
        assert_eq!(
            decode_coordinate(&RawCoordinate::new(5.0, -5.0)),
            Err(Rejection::NearNullIsland)
        );
        let raw = RawCoordinate::with_precision(90.0, 90.0, Precision::Fine);
        assert_eq!(decode_coordinate(&raw), Err(Rejection::NearNullIsland));
    }

    #[test]
    fn test_only_one_axis_near_zero_is_kept() {
        // On the equator, well away from the meridian
        let p = decode_coordinate(&RawCoordinate::new(300_000.0, 5.0)).unwrap();
        assert_relative_eq!(p.longitude, 30.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        // 950000 / 10000 = 95 degrees latitude
        assert_eq!(
            decode_coordinate(&RawCoordinate::new(100_000.0, 950_000.0)),
            Err(Rejection::OutOfRange)
        );
        assert_eq!(
            decode_coordinate(&RawCoordinate::new(f64::NAN, 100_000.0)),
            Err(Rejection::OutOfRange)
        );
    }

    #[test]
    fn test_decode_is_pure_and_in_range() {
        let raws = [
            RawCoordinate::new(-8_304_580.0, 4_233_150.0),
            RawCoordinate::new(1_512_153.0, -338_568.0),
            RawCoordinate::new(-17_999_999.0, 8_999_999.0),
            RawCoordinate::new(1_799_999.0, -899_999.0),
        ];
        for raw in &raws {
            let first = decode_coordinate(raw).unwrap();
            let second = decode_coordinate(raw).unwrap();
            assert_eq!(first, second);
            assert!(first.is_valid());
        }
    }

    #[test]
    fn test_heading_normalization() {
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(45.5), 45.5);
        assert!(normalize_heading(-1e-20) < 360.0);
    }

    #[test]
    fn test_dms_to_decimal() {
        assert_relative_eq!(dms_to_decimal(42.0, 19.0, 54.0), 42.331_666_666, epsilon = 1e-6);
        assert_relative_eq!(dms_to_decimal(-83.0, 2.0, 45.0), -83.045_833_333, epsilon = 1e-6);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = DecodeStats::default();
        stats.record(&decode_coordinate(&RawCoordinate::new(0.0, 0.0)));
        stats.record(&decode_coordinate(&RawCoordinate::new(-830_458.0, 423_315.0)));
        stats.record(&decode_coordinate(&RawCoordinate::new(5.0, 5.0)));
        assert_eq!(stats.seen, 3);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.filtered(), 2);

        let mut total = DecodeStats::default();
        total += stats;
        total += stats;
        assert_eq!(total.seen, 6);
        assert_eq!(total.near_null_island, 2);
    }
}
