//! # SYNC Geo Analyzer
//!
//! Correlates and summarizes positional data recovered from infotainment
//! diagnostic logs.
//!
//! Upstream extraction hands over typed records per log file. From those
//! the engine:
//! - decodes scaled map-matched coordinates and drops bad fixes
//! - places WiFi sightings and telemetry samples at the fix nearest in time
//! - groups fixes into visited locations
//! - splits fixes into trips on inactivity gaps, with distance and speed
//!
//! ## Quick Start
//!
//! ```rust
//! use sync_geo_analyzer::{Analyzer, AnalyzerConfig, EventRecord, EventStream};
//!
//! let records = vec![EventRecord {
//!     kind: "gps".into(),
//!     timestamp: "10/14/2025 08:15:02.417".into(),
//!     line: 1,
//!     raw_lon: Some(-8_304_580.0),
//!     raw_lat: Some(4_233_150.0),
//!     altitude_m: Some(190.0),
//!     heading_deg: Some(87.0),
//!     ..Default::default()
//! }];
//!
//! let stream = EventStream::from_records("pas_debug.log", records);
//! let report = Analyzer::new(AnalyzerConfig::default()).run(&[stream]);
//! assert_eq!(report.fixes.len(), 1);
//! ```

pub mod error;
pub use error::{AnalyzerError, Result};

pub mod config;
pub use config::{
    AnalyzerConfig, ClusterConfig, CorrelationConfig, ScanStrategy, TripConfig, WifiSearchConfig,
};

pub mod model;
pub use model::{
    Event, GeoPoint, GpsFix, RawCoordinate, RawGpsSample, TelemetrySample, TimedPoint, Timestamped,
    WifiSighting,
};

pub mod timestamp;
pub use timestamp::parse_log_timestamp;

pub mod decoder;
pub use decoder::{decode_coordinate, decode_fix, DecodeStats, Precision, Rejection};

pub mod distance;
pub use distance::{haversine_distance, path_length, EARTH_RADIUS_M};

pub mod stream;
pub use stream::{EventRecord, EventStream};

pub mod correlate;
pub use correlate::{
    correlate_sightings, correlate_telemetry, CorrelatedSighting, CorrelatedTelemetry, Match,
    TemporalCorrelator,
};

pub mod wifi;
pub use wifi::{
    sightings_near, summarize_by_ssid, summarize_networks, LocatedSighting, NetworkSummary,
    SsidSummary,
};

pub mod cluster;
pub use cluster::{cluster_points, Cluster, LocationSummary};

pub mod trip;
pub use trip::{segment_trips, Segmentation, Trip};

pub mod track;
pub use track::{trip_to_gpx, write_trip_gpx};

pub mod pipeline;
pub use pipeline::{AnalysisReport, Analyzer};
