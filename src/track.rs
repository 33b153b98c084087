//! GPX track conversion
//!
//! Turns a trip into a one-track, one-segment GPX document carrying time
//! and elevation per point, ready for any downstream track writer.

use chrono::NaiveDateTime;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use std::io::Write;
use time::OffsetDateTime;

use crate::error::Result;
use crate::trip::Trip;

const CREATOR: &str = "sync-geo-analyzer";

/// Log timestamps carry no offset; they are exported as UTC.
fn to_gpx_time(ts: NaiveDateTime) -> Option<gpx::Time> {
    let utc = ts.and_utc();
    let nanos =
        i128::from(utc.timestamp()) * 1_000_000_000 + i128::from(utc.timestamp_subsec_nanos());
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .map(gpx::Time::from)
}

/// Build a GPX document holding `trip` as a single track.
pub fn trip_to_gpx(trip: &Trip) -> Gpx {
    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some(CREATOR.to_string());

    let mut track = Track::new();
    track.name = Some(format!("GPS Track - {}", trip.start.format("%Y-%m-%d %H:%M:%S")));
    track.description = Some(format!(
        "{:.1} minutes, {:.2} km, {:.1} km/h average, {} points",
        trip.duration_s / 60.0,
        trip.distance_m / 1000.0,
        trip.avg_speed_kmh,
        trip.len()
    ));

    let mut segment = TrackSegment::new();
    for fix in &trip.points {
        let mut waypoint = Waypoint::new(fix.point.into());
        waypoint.elevation = Some(fix.altitude_m);
        waypoint.time = to_gpx_time(fix.timestamp);
        segment.points.push(waypoint);
    }

    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

/// Serialize `trip` as GPX into `writer`.
pub fn write_trip_gpx<W: Write>(trip: &Trip, writer: W) -> Result<()> {
    gpx::write(&trip_to_gpx(trip), writer)?;
    Ok(())
}
