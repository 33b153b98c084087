//! Visited-location clustering
//!
//! Greedy single pass: the first unclaimed point seeds a cluster and claims
//! every remaining point within the radius of that seed. Membership is
//! judged against the seed, never the running centroid, so two members can
//! be up to twice the radius apart and results depend on input order.
//! O(n²) in the number of points, which is fine for the few thousand fixes
//! a log set produces and not beyond that.

use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;

use crate::distance::haversine_distance;
use crate::model::{GeoPoint, TimedPoint};

/// A group of nearby points treated as one visited location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Point that opened the cluster; every member is within radius of it.
    pub seed: GeoPoint,
    /// Mean of member coordinates, computed once when the cluster closes.
    pub centroid: GeoPoint,
    /// Members in admission order, seed first.
    pub members: Vec<TimedPoint>,
    pub count: usize,
}

impl Cluster {
    fn close(seed: GeoPoint, members: Vec<TimedPoint>) -> Self {
        let n = members.len() as f64;
        let (lat_sum, lon_sum) = members.iter().fold((0.0, 0.0), |(lat, lon), m| {
            (lat + m.point.latitude, lon + m.point.longitude)
        });

        Self {
            seed,
            centroid: GeoPoint::new(lat_sum / n, lon_sum / n),
            count: members.len(),
            members,
        }
    }

    pub fn first_visit(&self) -> Option<NaiveDateTime> {
        self.members.iter().map(|m| m.timestamp).min()
    }

    pub fn last_visit(&self) -> Option<NaiveDateTime> {
        self.members.iter().map(|m| m.timestamp).max()
    }

    /// Percentage of `total_points` that fell in this cluster.
    pub fn share_percent(&self, total_points: usize) -> f64 {
        if total_points == 0 {
            0.0
        } else {
            self.count as f64 / total_points as f64 * 100.0
        }
    }
}

/// Partition `points` into clusters, largest first.
///
/// Clusters with equal counts keep the order in which they were formed.
pub fn cluster_points(points: &[TimedPoint], radius_m: f64) -> Vec<Cluster> {
    let mut claimed = vec![false; points.len()];
    let mut clusters = Vec::new();

    for i in 0..points.len() {
        if claimed[i] {
            continue;
        }
        claimed[i] = true;

        let seed = points[i].point;
        let mut members = vec![points[i]];

        // Everything before i is already claimed
        for j in (i + 1)..points.len() {
            if !claimed[j] && haversine_distance(&seed, &points[j].point) <= radius_m {
                claimed[j] = true;
                members.push(points[j]);
            }
        }

        clusters.push(Cluster::close(seed, members));
    }

    // sort_by is stable
    clusters.sort_by(|a, b| b.count.cmp(&a.count));

    debug!(
        "clustered {} points into {} locations (radius {} m)",
        points.len(),
        clusters.len(),
        radius_m
    );
    clusters
}

/// Overview of where a vehicle spent its time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub total_points: usize,
    pub cluster_count: usize,
    /// Up to `top_n` largest clusters.
    pub top: Vec<Cluster>,
    pub top_points: usize,
    pub other_points: usize,
    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
}

impl LocationSummary {
    /// `clusters` must be sorted largest first, as [`cluster_points`] returns them.
    pub fn new(clusters: &[Cluster], top_n: usize) -> Self {
        let total_points: usize = clusters.iter().map(|c| c.count).sum();
        let top: Vec<Cluster> = clusters.iter().take(top_n).cloned().collect();
        let top_points: usize = top.iter().map(|c| c.count).sum();

        Self {
            total_points,
            cluster_count: clusters.len(),
            top_points,
            other_points: total_points - top_points,
            first_seen: clusters.iter().filter_map(Cluster::first_visit).min(),
            last_seen: clusters.iter().filter_map(Cluster::last_visit).max(),
            top,
        }
    }

    pub fn top_share_percent(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            self.top_points as f64 / self.total_points as f64 * 100.0
        }
    }
}
