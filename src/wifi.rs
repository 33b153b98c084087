//! WiFi-to-location analysis
//!
//! Works on sightings already placed at a GPS fix: which networks were
//! seen near a target location, and how often each network shows up.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

use crate::correlate::CorrelatedSighting;
use crate::distance::haversine_distance;
use crate::model::{GeoPoint, WifiSighting};

/// A correlated sighting with its distance to a search target.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedSighting {
    pub correlated: CorrelatedSighting,
    pub distance_m: f64,
}

/// Sightings whose matched fix lies within `radius_m` of `target`,
/// closest first.
pub fn sightings_near(
    correlated: &[CorrelatedSighting],
    target: &GeoPoint,
    radius_m: f64,
) -> Vec<LocatedSighting> {
    let mut located: Vec<LocatedSighting> = correlated
        .iter()
        .filter_map(|c| {
            let distance_m = haversine_distance(target, &c.fix.point);
            (distance_m <= radius_m).then(|| LocatedSighting {
                correlated: c.clone(),
                distance_m,
            })
        })
        .collect();

    sort_by_distance(&mut located);
    located
}

/// Closest first; equal distances keep time order.
pub fn sort_by_distance(located: &mut [LocatedSighting]) {
    located.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then(a.correlated.sighting.timestamp.cmp(&b.correlated.sighting.timestamp))
    });
}

/// Chronological by sighting time.
pub fn sort_by_time(correlated: &mut [CorrelatedSighting]) {
    correlated.sort_by_key(|c| c.sighting.timestamp);
}

/// Detections grouped by network name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsidSummary {
    /// `None` groups every hidden network together.
    pub ssid: Option<String>,
    pub detections: usize,
    pub unique_bssids: usize,
    pub min_signal: i32,
    pub max_signal: i32,
}

/// Detections grouped by (BSSID, SSID) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub bssid: String,
    pub ssid: Option<String>,
    pub detections: usize,
    pub min_signal: i32,
    pub max_signal: i32,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
}

/// Per-SSID counts, most detected first.
pub fn summarize_by_ssid<'a, I>(sightings: I) -> Vec<SsidSummary>
where
    I: IntoIterator<Item = &'a WifiSighting>,
{
    let mut groups: BTreeMap<Option<String>, (usize, BTreeSet<&'a str>, i32, i32)> =
        BTreeMap::new();

    for s in sightings {
        let entry = groups
            .entry(s.ssid.clone())
            .or_insert((0, BTreeSet::new(), i32::MAX, i32::MIN));
        entry.0 += 1;
        entry.1.insert(s.bssid.as_str());
        entry.2 = entry.2.min(s.signal_strength);
        entry.3 = entry.3.max(s.signal_strength);
    }

    let mut summaries: Vec<SsidSummary> = groups
        .into_iter()
        .map(|(ssid, (detections, bssids, min_signal, max_signal))| SsidSummary {
            ssid,
            detections,
            unique_bssids: bssids.len(),
            min_signal,
            max_signal,
        })
        .collect();

    // Stable: equal counts stay in SSID order
    summaries.sort_by(|a, b| b.detections.cmp(&a.detections));
    summaries
}

/// Per-access-point counts, most detected first.
pub fn summarize_networks<'a, I>(sightings: I) -> Vec<NetworkSummary>
where
    I: IntoIterator<Item = &'a WifiSighting>,
{
    let mut groups: BTreeMap<(String, Option<String>), NetworkSummary> = BTreeMap::new();

    for s in sightings {
        groups
            .entry((s.bssid.clone(), s.ssid.clone()))
            .and_modify(|n| {
                n.detections += 1;
                n.min_signal = n.min_signal.min(s.signal_strength);
                n.max_signal = n.max_signal.max(s.signal_strength);
                n.first_seen = n.first_seen.min(s.timestamp);
                n.last_seen = n.last_seen.max(s.timestamp);
            })
            .or_insert_with(|| NetworkSummary {
                bssid: s.bssid.clone(),
                ssid: s.ssid.clone(),
                detections: 1,
                min_signal: s.signal_strength,
                max_signal: s.signal_strength,
                first_seen: s.timestamp,
                last_seen: s.timestamp,
            });
    }

    let mut summaries: Vec<NetworkSummary> = groups.into_values().collect();
    summaries.sort_by(|a, b| b.detections.cmp(&a.detections));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GpsFix;
    use chrono::Duration;

    fn t0() -> NaiveDateTime {
        crate::timestamp::parse_log_timestamp("2025-06-01 09:00:00").unwrap()
    }

    fn sighting(secs: i64, bssid: &str, ssid: Option<&str>, signal: i32) -> WifiSighting {
        WifiSighting {
            timestamp: t0() + Duration::seconds(secs),
            bssid: bssid.to_string(),
            ssid: ssid.map(str::to_string),
            signal_strength: signal,
            source_line: secs as usize,
        }
    }

    fn correlated(secs: i64, lat: f64, lon: f64) -> CorrelatedSighting {
        CorrelatedSighting {
            sighting: sighting(secs, "00:11:22:33:44:55", Some("Cafe"), -50),
            fix: GpsFix {
                timestamp: t0() + Duration::seconds(secs),
                point: GeoPoint::new(lat, lon),
                altitude_m: 20.0,
                heading_deg: 0.0,
                satellite_count: 7,
                source_file: "pas_debug.log".to_string(),
                source_line: secs as usize,
            },
            time_delta_secs: 0.0,
        }
    }

    #[test]
    fn test_sightings_near_filters_and_sorts() {
        let target = GeoPoint::new(-33.8568, 151.2153);
        let all = vec![
            correlated(1, -33.8568 + 0.0003, 151.2153), // ~33 m
            correlated(2, -33.8568, 151.2153),          // on target
            correlated(3, -33.8568 + 0.0010, 151.2153), // ~111 m
        ];

        let near = sightings_near(&all, &target, 50.0);
        assert_eq!(near.len(), 2);
        assert_eq!(near[0].correlated.sighting.source_line, 2);
        assert!(near[0].distance_m < near[1].distance_m);
        assert!(near[1].distance_m <= 50.0);
    }

    #[test]
    fn test_sort_by_time() {
        let mut all = vec![correlated(9, 0.0, 1.0), correlated(3, 0.0, 1.0)];
        sort_by_time(&mut all);
        assert_eq!(all[0].sighting.source_line, 3);
    }

    #[test]
    fn test_ssid_summary_groups_hidden() {
        let sightings = vec![
            sighting(1, "00:00:00:00:00:01", Some("Home"), -40),
            sighting(2, "00:00:00:00:00:02", Some("Home"), -70),
            sighting(3, "00:00:00:00:00:01", Some("Home"), -55),
            sighting(4, "00:00:00:00:00:09", None, -80),
            sighting(5, "00:00:00:00:00:0a", None, -82),
        ];

        let summaries = summarize_by_ssid(&sightings);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].ssid.as_deref(), Some("Home"));
        assert_eq!(summaries[0].detections, 3);
        assert_eq!(summaries[0].unique_bssids, 2);
        assert_eq!((summaries[0].min_signal, summaries[0].max_signal), (-70, -40));
        assert_eq!(summaries[1].ssid, None);
        assert_eq!(summaries[1].unique_bssids, 2);
    }

    #[test]
    fn test_network_summary_tracks_first_and_last_seen() {
        let sightings = vec![
            sighting(30, "00:00:00:00:00:01", Some("Home"), -40),
            sighting(10, "00:00:00:00:00:01", Some("Home"), -60),
            sighting(20, "00:00:00:00:00:02", Some("Guest"), -75),
        ];

        let networks = summarize_networks(&sightings);
        assert_eq!(networks.len(), 2);
        let home = &networks[0];
        assert_eq!(home.detections, 2);
        assert_eq!(home.first_seen, t0() + Duration::seconds(10));
        assert_eq!(home.last_seen, t0() + Duration::seconds(30));
        assert_eq!(home.min_signal, -60);
    }
}
