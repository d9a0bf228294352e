//! Interval series validation and artifact filtering
//!
//! Raw beat-to-beat recordings carry artifacts: missed or doubled beats from
//! sensor dropouts and ectopic beats that are real but distort variability
//! statistics. Filtering drops intervals outside the plausible physiological
//! range and successive beats whose relative change exceeds the ectopic
//! threshold. Rejected intervals are dropped rather than interpolated, and the
//! rejection fraction is kept as a quality signal on the reading.

use crate::config::ValidatorConfig;
use crate::error::CoreError;
use crate::types::{ArtifactStats, IntervalSeries};
use tracing::warn;

/// A filtered interval series together with its rejection statistics.
#[derive(Debug, Clone)]
pub struct CleanedSeries {
    /// Surviving intervals (ms), original order preserved
    pub intervals_ms: Vec<f64>,
    pub stats: ArtifactStats,
}

impl CleanedSeries {
    /// Whether the rejection fraction exceeded the configured ceiling.
    pub fn over_rejection_ceiling(&self, config: &ValidatorConfig) -> bool {
        self.stats.rejection_ratio > config.rejection_ceiling
    }
}

/// Validate an interval series and drop artifacts.
///
/// Fails with [`CoreError::Validation`] when the series is empty, contains
/// non-finite values, or fewer than `min_intervals` beats survive filtering.
/// A high rejection fraction is not a failure; the caller inspects
/// [`CleanedSeries::over_rejection_ceiling`].
pub fn clean_series(
    series: &IntervalSeries,
    config: &ValidatorConfig,
) -> Result<CleanedSeries, CoreError> {
    let raw = &series.intervals_ms;

    if raw.is_empty() {
        return Err(CoreError::Validation("interval series is empty".into()));
    }
    if raw.iter().any(|v| !v.is_finite()) {
        return Err(CoreError::Validation(
            "interval series contains non-finite values".into(),
        ));
    }

    let span_secs = raw.iter().sum::<f64>() / 1000.0;

    let mut kept: Vec<f64> = Vec::with_capacity(raw.len());
    for &interval in raw {
        if interval < config.min_interval_ms || interval > config.max_interval_ms {
            continue;
        }
        if let Some(&prev) = kept.last() {
            // Ectopic beat: relative jump from the last accepted interval
            if (interval - prev).abs() / prev > config.ectopic_threshold {
                continue;
            }
        }
        kept.push(interval);
    }

    let rejected = raw.len() - kept.len();
    let rejection_ratio = rejected as f64 / raw.len() as f64;

    if kept.len() < config.min_intervals {
        return Err(CoreError::Validation(format!(
            "only {} of {} intervals usable (minimum {})",
            kept.len(),
            raw.len(),
            config.min_intervals
        )));
    }

    if rejection_ratio > config.rejection_ceiling {
        warn!(
            rejected,
            total = raw.len(),
            ratio = rejection_ratio,
            "artifact rejection above ceiling; reading will be flagged poor quality"
        );
    }

    Ok(CleanedSeries {
        stats: ArtifactStats {
            total: raw.len(),
            kept: kept.len(),
            rejected,
            rejection_ratio,
            span_secs,
        },
        intervals_ms: kept,
    })
}
