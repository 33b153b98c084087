//! Nearest-in-time joins between independently extracted event streams.
//!
//! WiFi scans, telemetry and GPS fixes share no key in the logs. The only
//! link is when they were written, so each anchor event is paired with the
//! single candidate closest to it in time.
//!
//! By default only candidates within a fixed number of lines of the anchor
//! are considered. Events that are close in time are nearly always close
//! in the file, but this is an approximation: a log that is locally out of
//! time order can hide a legitimate match outside the line window.
//! [`ScanStrategy::FullScan`] trades that approximation for an O(n) scan
//! per anchor.

use log::debug;
use std::ops::Range;

use crate::config::{CorrelationConfig, ScanStrategy};
use crate::model::{GpsFix, TelemetrySample, Timestamped, WifiSighting};
use crate::timestamp::seconds_between;

/// The closest candidate found for an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a, T> {
    pub candidate: &'a T,
    /// Position of `candidate` within the searched slice.
    pub index: usize,
    /// Signed `candidate - anchor`, seconds.
    pub time_delta_secs: f64,
}

/// Finds the closest-in-time candidate for an anchor event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalCorrelator {
    config: CorrelationConfig,
}

impl TemporalCorrelator {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Closest candidate to `anchor`, or `None` if nothing qualifies.
    ///
    /// `candidates` must be sorted by source line for the line-bounded
    /// strategy, which is how [`crate::EventStream`] yields them.
    /// Ties on |delta| go to the earliest source line.
    pub fn nearest<'a, A, T>(&self, anchor: &A, candidates: &'a [T]) -> Option<Match<'a, T>>
    where
        A: Timestamped,
        T: Timestamped,
    {
        let anchor_time = anchor.timestamp();
        let mut best: Option<Match<'a, T>> = None;

        for index in self.scan_range(anchor.source_line(), candidates) {
            let candidate = &candidates[index];
            let delta = seconds_between(anchor_time, candidate.timestamp());
            if delta.abs() > self.config.window_seconds {
                continue;
            }

            let closer = match &best {
                None => true,
                Some(current) => {
                    let (d, c) = (delta.abs(), current.time_delta_secs.abs());
                    d < c || (d == c && candidate.source_line() < current.candidate.source_line())
                }
            };

            if closer {
                best = Some(Match {
                    candidate,
                    index,
                    time_delta_secs: delta,
                });
            }
        }

        best
    }

    fn scan_range<T: Timestamped>(&self, anchor_line: usize, candidates: &[T]) -> Range<usize> {
        match self.config.strategy {
            ScanStrategy::FullScan => 0..candidates.len(),
            ScanStrategy::LineBounded => {
                let lo = anchor_line.saturating_sub(self.config.window_lines);
                let hi = anchor_line.saturating_add(self.config.window_lines);
                let start = candidates.partition_point(|c| c.source_line() < lo);
                let end = candidates.partition_point(|c| c.source_line() <= hi);
                start..end.max(start)
            }
        }
    }

    /// Pair every anchor with its closest fix, dropping anchors without one.
    pub fn join<'a, A, I>(&self, anchors: I, fixes: &[GpsFix]) -> Vec<(A, GpsFix, f64)>
    where
        A: Timestamped + Clone + 'a,
        I: IntoIterator<Item = &'a A>,
    {
        let mut joined = Vec::new();
        let mut unmatched = 0usize;

        for anchor in anchors {
            match self.nearest(anchor, fixes) {
                Some(m) => joined.push((anchor.clone(), m.candidate.clone(), m.time_delta_secs)),
                None => unmatched += 1,
            }
        }

        if unmatched > 0 {
            debug!(
                "{} of {} events had no fix within ±{}s",
                unmatched,
                unmatched + joined.len(),
                self.config.window_seconds
            );
        }
        joined
    }
}

/// A WiFi sighting placed at the fix nearest to it in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedSighting {
    pub sighting: WifiSighting,
    pub fix: GpsFix,
    /// Signed `fix - sighting`, seconds.
    pub time_delta_secs: f64,
}

/// A telemetry sample placed at the fix nearest to it in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedTelemetry {
    pub sample: TelemetrySample,
    pub fix: GpsFix,
    pub time_delta_secs: f64,
}

/// Correlate WiFi sightings from one file with that file's fixes.
pub fn correlate_sightings<'a, I>(
    sightings: I,
    fixes: &[GpsFix],
    config: &CorrelationConfig,
) -> Vec<CorrelatedSighting>
where
    I: IntoIterator<Item = &'a WifiSighting>,
{
    TemporalCorrelator::new(*config)
        .join(sightings, fixes)
        .into_iter()
        .map(|(sighting, fix, time_delta_secs)| CorrelatedSighting {
            sighting,
            fix,
            time_delta_secs,
        })
        .collect()
}

/// Correlate telemetry samples from one file with that file's fixes.
pub fn correlate_telemetry<'a, I>(
    samples: I,
    fixes: &[GpsFix],
    config: &CorrelationConfig,
) -> Vec<CorrelatedTelemetry>
where
    I: IntoIterator<Item = &'a TelemetrySample>,
{
    TemporalCorrelator::new(*config)
        .join(samples, fixes)
        .into_iter()
        .map(|(sample, fix, time_delta_secs)| CorrelatedTelemetry {
            sample,
            fix,
            time_delta_secs,
        })
        .collect()
}
