//! Metric extraction
//!
//! Turns a validated interval series into an [`HrvReading`]: time-domain
//! metrics always, frequency-domain metrics only when the cleaned series is
//! long enough and spans enough real time for a stable spectrum.

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::spectral;
use crate::types::{DataQuality, HrvReading, IntervalSeries, TimeDomain};
use crate::validator::clean_series;
use statrs::statistics::Statistics;
use tracing::debug;
use uuid::Uuid;

/// Extract HRV metrics from an interval series.
///
/// Fails only on unusable input ([`CoreError::Validation`]). A series below
/// the spectral requirements still yields a reading, with `frequency: None`
/// and quality [`DataQuality::Insufficient`]; a high artifact rate yields
/// quality [`DataQuality::Poor`]. The caller decides whether to persist
/// flagged readings.
pub fn extract_metrics(
    series: &IntervalSeries,
    config: &EngineConfig,
) -> Result<HrvReading, CoreError> {
    let cleaned = clean_series(series, &config.validator)?;
    let time = time_domain(&cleaned.intervals_ms);

    let spectral_eligible = cleaned.intervals_ms.len() >= config.spectral.min_intervals
        && cleaned.stats.span_secs >= config.spectral.min_recording_secs;

    let frequency = if spectral_eligible {
        match spectral::estimate(&cleaned.intervals_ms, &config.spectral) {
            Ok(fd) => Some(fd),
            Err(CoreError::InsufficientData(reason)) => {
                debug!(%reason, "spectrum skipped despite eligible series");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    let quality = if cleaned.over_rejection_ceiling(&config.validator) {
        DataQuality::Poor
    } else if frequency.is_none() {
        DataQuality::Insufficient
    } else {
        DataQuality::Good
    };

    Ok(HrvReading {
        id: Uuid::new_v4(),
        recorded_at: series.recorded_at,
        time,
        frequency,
        artifacts: cleaned.stats,
        sleep: series.sleep.clone(),
        quality,
    })
}

/// Time-domain metrics over a cleaned interval series.
///
/// Callers must pass at least two intervals; [`clean_series`] guarantees the
/// configured minimum.
fn time_domain(intervals: &[f64]) -> TimeDomain {
    let mean_rr_ms = intervals.iter().mean();
    let mean_hr_bpm = 60_000.0 / mean_rr_ms;
    let sdnn_ms = intervals.iter().std_dev();

    let diffs: Vec<f64> = intervals.windows(2).map(|w| w[1] - w[0]).collect();
    let rmssd_ms = (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt();
    let nn50 = diffs.iter().filter(|d| d.abs() > 50.0).count();
    let pnn50_pct = nn50 as f64 / diffs.len() as f64 * 100.0;

    TimeDomain {
        mean_rr_ms,
        mean_hr_bpm,
        sdnn_ms,
        rmssd_ms,
        pnn50_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::distributions::Distribution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::Normal;

    fn make_series(intervals: Vec<f64>) -> IntervalSeries {
        IntervalSeries::new(Utc::now(), intervals)
    }

    /// Alternating ±d around a base interval has RMSSD exactly d.
    fn alternating(base_ms: f64, d: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { base_ms } else { base_ms + d })
            .collect()
    }

    #[test]
    fn test_time_domain_known_values() {
        let reading =
            extract_metrics(&make_series(alternating(900.0, 40.0, 60)), &EngineConfig::default())
                .unwrap();

        assert!((reading.time.mean_rr_ms - 920.0).abs() < 1e-9);
        assert!((reading.time.mean_hr_bpm - 60_000.0 / 920.0).abs() < 1e-9);
        assert!((reading.time.rmssd_ms - 40.0).abs() < 1e-9);
        // |diff| = 40 never exceeds 50 ms
        assert!(reading.time.pnn50_pct.abs() < 1e-9);
    }

    #[test]
    fn test_rmssd_zero_iff_constant() {
        let reading =
            extract_metrics(&make_series(vec![850.0; 60]), &EngineConfig::default()).unwrap();
        assert_eq!(reading.time.rmssd_ms, 0.0);
        assert_eq!(reading.time.sdnn_ms, 0.0);

        let reading =
            extract_metrics(&make_series(alternating(850.0, 1.0, 60)), &EngineConfig::default())
                .unwrap();
        assert!(reading.time.rmssd_ms > 0.0);
    }

    #[test]
    fn test_pnn50_counts_large_differences() {
        let reading =
            extract_metrics(&make_series(alternating(900.0, 60.0, 61)), &EngineConfig::default())
                .unwrap();
        // Every successive difference is ±60 ms
        assert!((reading.time.pnn50_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_gaussian_series_recovers_rmssd() {
        // Independent Gaussian jitter of sd σ around a fixed mean gives
        // successive differences with variance 2σ², so RMSSD → σ√2.
        let sigma = 45.0 / std::f64::consts::SQRT_2;
        let normal = Normal::new(0.0, sigma).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let intervals: Vec<f64> = (0..2000).map(|_| 1000.0 + normal.sample(&mut rng)).collect();

        let reading = extract_metrics(&make_series(intervals), &EngineConfig::default()).unwrap();
        let err = (reading.time.rmssd_ms - 45.0).abs() / 45.0;
        assert!(err < 0.05, "rmssd {} off by {:.1}%", reading.time.rmssd_ms, err * 100.0);
    }

    #[test]
    fn test_short_series_omits_spectrum() {
        // 60 intervals pass validation but are below the spectral minimum
        let reading =
            extract_metrics(&make_series(alternating(850.0, 20.0, 60)), &EngineConfig::default())
                .unwrap();
        assert!(reading.frequency.is_none());
        assert_eq!(reading.quality, DataQuality::Insufficient);
        assert!(reading.time.rmssd_ms > 0.0);
    }

    #[test]
    fn test_long_series_includes_spectrum() {
        // ~6 minutes of beats with 0.25 Hz respiratory-band modulation
        let mut intervals = Vec::new();
        let mut elapsed = 0.0;
        while elapsed < 360.0 {
            let v = 800.0 + 30.0 * (2.0 * std::f64::consts::PI * 0.25 * elapsed).sin();
            intervals.push(v);
            elapsed += v / 1000.0;
        }

        let reading = extract_metrics(&make_series(intervals), &EngineConfig::default()).unwrap();
        assert_eq!(reading.quality, DataQuality::Good);
        let fd = reading.frequency.expect("spectrum expected");
        assert!(fd.hf_power > fd.lf_power);
    }

    #[test]
    fn test_poor_quality_still_returned() {
        let mut intervals = alternating(850.0, 20.0, 100);
        for i in 0..12 {
            intervals[i * 8] = 120.0; // 12% artifacts
        }
        let reading = extract_metrics(&make_series(intervals), &EngineConfig::default()).unwrap();
        assert_eq!(reading.quality, DataQuality::Poor);
        assert!(reading.artifacts.rejection_ratio > 0.10);
    }
}
