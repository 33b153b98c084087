//! Analyzer parameters
//!
//! Every section has defaults matching the existing log tooling, so a JSON
//! file only needs the keys it wants to change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{AnalyzerError, Result};
use crate::model::GeoPoint;

/// How the correlator chooses which candidates to look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStrategy {
    /// Only candidates within `window_lines` of the anchor's line. Cheap,
    /// but misses matches when a log is out of time order locally.
    #[default]
    LineBounded,
    /// Every candidate in the file, filtered by time alone.
    FullScan,
}

/// Temporal join parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Half-width of the line window around the anchor
    pub window_lines: usize,
    /// Largest accepted |time delta| in seconds (inclusive)
    pub window_seconds: f64,
    pub strategy: ScanStrategy,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window_lines: 50,
            window_seconds: 2.0,
            strategy: ScanStrategy::LineBounded,
        }
    }
}

/// Visited-location clustering parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Admission radius around a cluster's seed, meters
    pub radius_m: f64,
    /// Clusters listed individually in the location summary
    pub top_n: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_m: 100.0,
            top_n: 3,
        }
    }
}

/// Trip segmentation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripConfig {
    /// Inactivity gap that starts a new trip, seconds (exclusive)
    pub gap_secs: f64,
    /// Trips with fewer points are discarded
    pub min_points: usize,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            gap_secs: 120.0,
            min_points: 3,
        }
    }
}

/// Target-location WiFi search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiSearchConfig {
    /// When unset, no target search is performed
    pub target: Option<GeoPoint>,
    pub radius_m: f64,
}

impl Default for WifiSearchConfig {
    fn default() -> Self {
        Self {
            target: None,
            radius_m: 50.0,
        }
    }
}

/// Full analyzer configuration. Every section falls back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub correlation: CorrelationConfig,
    pub clustering: ClusterConfig,
    pub trips: TripConfig,
    pub wifi: WifiSearchConfig,
}

impl AnalyzerConfig {
    /// Load a (possibly partial) JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(AnalyzerError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };

        positive("correlation.window_seconds", self.correlation.window_seconds)?;
        positive("clustering.radius_m", self.clustering.radius_m)?;
        positive("trips.gap_secs", self.trips.gap_secs)?;
        positive("wifi.radius_m", self.wifi.radius_m)?;

        if let Some(target) = self.wifi.target {
            if !target.is_valid() {
                return Err(AnalyzerError::InvalidConfig(format!(
                    "wifi.target out of range: {target:?}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.correlation.window_lines, 50);
        assert_eq!(config.correlation.window_seconds, 2.0);
        assert_eq!(config.clustering.radius_m, 100.0);
        assert_eq!(config.trips.gap_secs, 120.0);
        assert_eq!(config.trips.min_points, 3);
        assert_eq!(config.wifi.radius_m, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "correlation": { "strategy": "full_scan" },
            "wifi": { "target": { "latitude": -33.8568, "longitude": 151.2153 } }
        }"#;
        let config: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.correlation.strategy, ScanStrategy::FullScan);
        assert_eq!(config.correlation.window_lines, 50);
        assert_eq!(config.wifi.radius_m, 50.0);
        assert!(config.wifi.target.is_some());
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let mut config = AnalyzerConfig::default();
        config.clustering.radius_m = 0.0;
        assert!(matches!(
            config.validate(),
            Err(AnalyzerError::InvalidConfig(_))
        ));

        let mut config = AnalyzerConfig::default();
        config.wifi.target = Some(GeoPoint::new(123.0, 0.0));
        assert!(config.validate().is_err());
    }
}
