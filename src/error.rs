//! Error types for log analysis.
//!
//! The core algorithms never fail: rejected fixes and missing matches are
//! ordinary values. Errors only arise at the edges, when an upstream record
//! breaks its contract or when files cannot be read or written.

use thiserror::Error;

/// Errors that can occur while loading records or writing results.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A record is missing a field its event type requires.
    #[error("line {line}: missing required field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
        /// Source line of the offending record.
        line: usize,
    },

    /// A timestamp did not match any known log format.
    #[error("unrecognised timestamp: {value:?}")]
    InvalidTimestamp {
        /// The raw timestamp text.
        value: String,
    },

    /// A record is structurally present but semantically unusable.
    #[error("line {line}: invalid record: {reason}")]
    InvalidRecord {
        /// Source line of the offending record.
        line: usize,
        /// Human readable description.
        reason: String,
    },

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("gpx export failed: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

impl AnalyzerError {
    /// Creates a missing field error.
    #[must_use]
    pub const fn missing(field: &'static str, line: usize) -> Self {
        Self::MissingField { field, line }
    }

    /// Creates an invalid record error.
    #[must_use]
    pub fn invalid(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            line,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
