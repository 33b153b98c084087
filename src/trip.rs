//! Trip segmentation
//!
//! A trip is a run of fixes with no inactivity gap longer than the
//! threshold. The gap is the only criterion: distance and heading changes
//! never split a trip. Short runs are thrown away, not merged.

use chrono::NaiveDateTime;
use geo::{BoundingRect, LineString, Rect};
use log::{debug, info};
use serde::Serialize;

use crate::config::TripConfig;
use crate::distance::path_length;
use crate::model::{GeoPoint, GpsFix};
use crate::timestamp::seconds_between;

/// One journey with its derived motion metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    /// Fixes in time order.
    pub points: Vec<GpsFix>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Sum of consecutive great-circle legs.
    pub distance_m: f64,
    pub duration_s: f64,
    /// Zero when the trip has no duration.
    pub avg_speed_kmh: f64,
}

impl Trip {
    /// Build a trip from time-ordered fixes. Returns `None` for an empty run.
    pub fn from_points(points: Vec<GpsFix>) -> Option<Self> {
        let start = points.first()?.timestamp;
        let end = points.last()?.timestamp;

        let distance_m = path_length(points.iter().map(|f| &f.point));
        let duration_s = seconds_between(start, end);
        let avg_speed_kmh = if duration_s > 0.0 {
            (distance_m / 1000.0) / (duration_s / 3600.0)
        } else {
            0.0
        };

        Some(Self {
            points,
            start,
            end,
            distance_m,
            duration_s,
            avg_speed_kmh,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_point(&self) -> Option<GeoPoint> {
        self.points.first().map(|f| f.point)
    }

    pub fn end_point(&self) -> Option<GeoPoint> {
        self.points.last().map(|f| f.point)
    }

    /// Bounding rectangle in (lon, lat) order.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let line: LineString<f64> = self.points.iter().map(|f| geo::Coord::from(f.point)).collect();
        line.bounding_rect()
    }

    /// File stem for per-trip exports, e.g. `output_2025-10-14-081502`.
    pub fn file_stem(&self) -> String {
        format!("output_{}", self.start.format("%Y-%m-%d-%H%M%S"))
    }
}

/// Trips kept plus how many runs were too short.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Segmentation {
    pub trips: Vec<Trip>,
    pub discarded: usize,
}

/// Split fixes into trips on inactivity gaps.
///
/// Input order does not matter; fixes are stably sorted by timestamp, so
/// equal timestamps keep their given order.
pub fn segment_trips(fixes: &[GpsFix], config: &TripConfig) -> Segmentation {
    let mut sorted = fixes.to_vec();
    sorted.sort_by_key(|f| f.timestamp);

    let mut runs: Vec<Vec<GpsFix>> = Vec::new();
    let mut current: Vec<GpsFix> = Vec::new();

    for fix in sorted {
        if let Some(last) = current.last() {
            if seconds_between(last.timestamp, fix.timestamp) > config.gap_secs {
                runs.push(std::mem::take(&mut current));
            }
        }
        current.push(fix);
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let total_runs = runs.len();
    let trips: Vec<Trip> = runs
        .into_iter()
        .filter(|run| run.len() >= config.min_points)
        .filter_map(Trip::from_points)
        .collect();

    for trip in &trips {
        debug!(
            "trip {} -> {}: {:.1} min, {:.2} km, {} points",
            trip.start,
            trip.end,
            trip.duration_s / 60.0,
            trip.distance_m / 1000.0,
            trip.len()
        );
    }

    let segmentation = Segmentation {
        discarded: total_runs - trips.len(),
        trips,
    };

    if !fixes.is_empty() {
        info!(
            "segmented {} fixes into {} trips ({} short runs discarded, gap {}s)",
            fixes.len(),
            segmentation.trips.len(),
            segmentation.discarded,
            config.gap_secs
        );
    }
    segmentation
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    fn t(secs: i64) -> NaiveDateTime {
        crate::timestamp::parse_log_timestamp("10/14/2025 08:15:02.000").unwrap()
            + Duration::seconds(secs)
    }

    fn fix(secs: i64, lat: f64, lon: f64, line: usize) -> GpsFix {
        GpsFix {
            timestamp: t(secs),
            point: GeoPoint::new(lat, lon),
            altitude_m: 200.0,
            heading_deg: 0.0,
            satellite_count: 10,
            source_file: "pas_debug.log".to_string(),
            source_line: line,
        }
    }

    fn two_point_config() -> TripConfig {
        TripConfig {
            gap_secs: 120.0,
            min_points: 2,
        }
    }

    #[test]
    fn test_empty_input() {
        let seg = segment_trips(&[], &TripConfig::default());
        assert!(seg.trips.is_empty());
        assert_eq!(seg.discarded, 0);
    }

    #[test]
    fn test_splits_on_gap() {
        let fixes = vec![
            fix(0, 42.0, -83.0, 1),
            fix(30, 42.001, -83.0, 2),
            fix(200, 42.002, -83.0, 3),
            fix(230, 42.003, -83.0, 4),
        ];
        let seg = segment_trips(&fixes, &two_point_config());
        assert_eq!(seg.trips.len(), 2);
        assert_eq!((seg.trips[0].start, seg.trips[0].end), (t(0), t(30)));
        assert_eq!((seg.trips[1].start, seg.trips[1].end), (t(200), t(230)));
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_split() {
        let fixes = vec![fix(0, 42.0, -83.0, 1), fix(120, 42.0, -83.0, 2)];
        let seg = segment_trips(&fixes, &two_point_config());
        assert_eq!(seg.trips.len(), 1);
    }

    #[test]
    fn test_gap_just_past_threshold_splits() {
        let mut fixes: Vec<GpsFix> =
            (0..3).map(|i| fix(i * 10, 42.0, -83.0, i as usize)).collect();
        for i in 0..3 {
            let mut f = fix(20 + 120 + i * 10, 42.0, -83.0, 10 + i as usize);
            f.timestamp += Duration::microseconds(900);
            fixes.push(f);
        }
        let seg = segment_trips(&fixes, &TripConfig::default());
        assert_eq!(seg.trips.len(), 2);
        assert_eq!(seg.trips[0].end, t(20));
        assert!(seg.trips[1].start > t(140));
    }

    #[test]
    fn test_short_trips_are_discarded() {
        let fixes = vec![
            fix(0, 42.0, -83.0, 1),
            fix(10, 42.0, -83.0, 2),
            fix(500, 42.0, -83.0, 3),
            fix(510, 42.0, -83.0, 4),
            fix(520, 42.0, -83.0, 5),
        ];
        let seg = segment_trips(&fixes, &TripConfig::default());
        assert_eq!(seg.trips.len(), 1);
        assert_eq!(seg.discarded, 1);
        assert_eq!(seg.trips[0].start, t(500));
    }

    #[test]
    fn test_unordered_input_is_sorted_stably() {
        let fixes = vec![
            fix(60, 42.002, -83.0, 30),
            fix(0, 42.000, -83.0, 10),
            fix(30, 42.001, -83.0, 20),
            fix(30, 42.001, -83.0, 21),
        ];
        let seg = segment_trips(&fixes, &TripConfig::default());
        let lines: Vec<usize> = seg.trips[0].points.iter().map(|f| f.source_line).collect();
        assert_eq!(lines, vec![10, 20, 21, 30]);
    }

    #[test]
    fn test_metrics() {
        // 0.01 degree hops along the equator, one per minute
        let fixes = vec![
            fix(0, 0.00, 10.0, 1),
            fix(60, 0.01, 10.0, 2),
            fix(120, 0.02, 10.0, 3),
        ];
        let seg = segment_trips(&fixes, &TripConfig::default());
        let trip = &seg.trips[0];

        assert_abs_diff_eq!(trip.distance_m, 2223.9, epsilon = 2.0);
        assert_eq!(trip.duration_s, 120.0);
        assert_abs_diff_eq!(trip.avg_speed_kmh, 66.7, epsilon = 0.1);
        assert_eq!(trip.start_point(), Some(GeoPoint::new(0.0, 10.0)));
        assert_eq!(trip.end_point(), Some(GeoPoint::new(0.02, 10.0)));
    }

    #[test]
    fn test_zero_duration_speed_is_zero() {
        let fixes = vec![
            fix(0, 42.0, -83.0, 1),
            fix(0, 42.001, -83.0, 2),
            fix(0, 42.002, -83.0, 3),
        ];
        let trip = &segment_trips(&fixes, &TripConfig::default()).trips[0];
        assert_eq!(trip.duration_s, 0.0);
        assert_eq!(trip.avg_speed_kmh, 0.0);
        assert!(trip.distance_m > 0.0);
    }

    #[test]
    fn test_bounds_and_file_stem() {
        let fixes = vec![
            fix(0, 42.0, -83.1, 1),
            fix(5, 42.2, -83.0, 2),
            fix(10, 42.1, -83.2, 3),
        ];
        let trip = Trip::from_points(fixes).unwrap();
        let rect = trip.bounds().unwrap();
        assert_eq!(rect.min().x, -83.2);
        assert_eq!(rect.max().y, 42.2);
        assert_eq!(trip.file_stem(), "output_2025-10-14-081502");
    }

    #[test]
    fn test_from_points_empty() {
        assert!(Trip::from_points(Vec::new()).is_none());
    }
}
