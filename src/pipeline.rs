//! Batch orchestration over a set of log files.
//!
//! Files are handled one after another. Decoding and temporal joins stay
//! inside a file, because line windows mean nothing across files. Trips and
//! visited locations are computed once over every accepted fix.

use log::info;

use crate::cluster::{cluster_points, Cluster, LocationSummary};
use crate::config::AnalyzerConfig;
use crate::correlate::{
    correlate_sightings, correlate_telemetry, CorrelatedSighting, CorrelatedTelemetry,
};
use crate::decoder::DecodeStats;
use crate::model::{GpsFix, TimedPoint};
use crate::stream::EventStream;
use crate::trip::{segment_trips, Segmentation};
use crate::wifi::{sightings_near, LocatedSighting};

/// Everything the engine produces for one batch.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub files: usize,
    pub decode_stats: DecodeStats,
    /// Records rejected before decoding (missing or malformed fields).
    pub rejected_records: usize,
    pub wifi_sightings: usize,
    pub fixes: Vec<GpsFix>,
    pub sightings: Vec<CorrelatedSighting>,
    pub telemetry: Vec<CorrelatedTelemetry>,
    /// Present only when a search target is configured.
    pub near_target: Option<Vec<LocatedSighting>>,
    pub clusters: Vec<Cluster>,
    pub segmentation: Segmentation,
}

impl AnalysisReport {
    pub fn location_summary(&self, top_n: usize) -> LocationSummary {
        LocationSummary::new(&self.clusters, top_n)
    }
}

/// Runs every analysis stage with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn run(&self, streams: &[EventStream]) -> AnalysisReport {
        let mut report = AnalysisReport {
            files: streams.len(),
            ..Default::default()
        };

        for stream in streams {
            let (fixes, stats) = stream.decode_fixes();

            let sightings =
                correlate_sightings(stream.wifi_sightings(), &fixes, &self.config.correlation);
            let telemetry =
                correlate_telemetry(stream.telemetry(), &fixes, &self.config.correlation);
            let wifi_total = stream.wifi_sightings().count();

            info!(
                "{}: {} valid GPS points ({} filtered), {}/{} WiFi sightings located, {} telemetry samples located",
                stream.source_file(),
                stats.accepted,
                stats.filtered(),
                sightings.len(),
                wifi_total,
                telemetry.len()
            );

            report.decode_stats += stats;
            report.rejected_records += stream.rejected();
            report.wifi_sightings += wifi_total;
            report.sightings.extend(sightings);
            report.telemetry.extend(telemetry);
            report.fixes.extend(fixes);
        }

        if let Some(target) = self.config.wifi.target {
            let near = sightings_near(&report.sightings, &target, self.config.wifi.radius_m);
            info!(
                "{} sightings within {} m of target",
                near.len(),
                self.config.wifi.radius_m
            );
            report.near_target = Some(near);
        }

        let points: Vec<TimedPoint> = report.fixes.iter().map(GpsFix::timed_point).collect();
        report.clusters = cluster_points(&points, self.config.clustering.radius_m);
        report.segmentation = segment_trips(&report.fixes, &self.config.trips);

        info!(
            "{} files: {} fixes, {} locations, {} trips",
            report.files,
            report.fixes.len(),
            report.clusters.len(),
            report.segmentation.trips.len()
        );
        report
    }
}
