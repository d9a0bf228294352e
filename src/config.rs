//! Engine configuration
//!
//! Every threshold and weight used by the pipeline lives here as an explicit,
//! documented default rather than a constant buried in the code, so boundary
//! values can be exercised directly from tests and tuned per deployment.

use serde::{Deserialize, Serialize};

/// Artifact filtering and series validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Shortest physiologically plausible beat interval (ms)
    pub min_interval_ms: f64,
    /// Longest physiologically plausible beat interval (ms)
    pub max_interval_ms: f64,
    /// Relative change between successive beats above which the later beat
    /// is treated as ectopic and dropped (0.20 = 20%)
    pub ectopic_threshold: f64,
    /// Minimum intervals that must survive filtering for the series to be usable
    pub min_intervals: usize,
    /// Rejection fraction above which the reading is flagged poor quality
    pub rejection_ceiling: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 300.0,
            max_interval_ms: 2000.0,
            ectopic_threshold: 0.20,
            min_intervals: 30,
            rejection_ceiling: 0.10,
        }
    }
}

/// Spectral estimation settings (Welch periodogram).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Minimum cleaned interval count before a spectrum is attempted
    pub min_intervals: usize,
    /// Minimum recording span (seconds) before a spectrum is attempted
    pub min_recording_secs: f64,
    /// Uniform resampling rate for the interval tachogram (Hz)
    pub resample_hz: f64,
    /// Welch segment length in samples
    pub segment_len: usize,
    /// Fractional overlap between successive Welch segments
    pub overlap: f64,
    /// Very-low-frequency band (Hz), half-open [lo, hi)
    pub vlf_band: (f64, f64),
    /// Low-frequency band (Hz), half-open [lo, hi)
    pub lf_band: (f64, f64),
    /// High-frequency band (Hz), closed [lo, hi]
    pub hf_band: (f64, f64),
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            min_intervals: 256,
            min_recording_secs: 300.0,
            resample_hz: 4.0,
            segment_len: 256,
            overlap: 0.5,
            vlf_band: (0.0033, 0.04),
            lf_band: (0.04, 0.15),
            hf_band: (0.15, 0.40),
        }
    }
}

/// Rolling baseline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Rolling window length in calendar days
    pub window_days: u32,
    /// Minimum distinct days with readings before a baseline is considered ready
    pub min_days: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window_days: 28,
            min_days: 7,
        }
    }
}

/// Composite readiness scoring weights.
///
/// Component weights must sum to 1.0; the defaults follow the
/// 40/30/20/10 HRV/RHR/sleep/stress split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub hrv_weight: f64,
    pub rhr_weight: f64,
    pub sleep_weight: f64,
    pub stress_weight: f64,
    /// Points of HRV component score per unit of combined z/HF deviation
    pub z_gain: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            hrv_weight: 0.40,
            rhr_weight: 0.30,
            sleep_weight: 0.20,
            stress_weight: 0.10,
            z_gain: 20.0,
        }
    }
}

/// PEM risk factor thresholds and point weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// History window inspected for multi-day patterns (days)
    pub lookback_days: u32,
    /// HRV z-score at or below which a day counts as "low"
    pub low_z_threshold: f64,
    /// Consecutive low days (including today) that trigger the sustained-low factor
    pub sustained_low_days: u32,
    /// Fractional heart-rate elevation over baseline RHR that triggers a factor (0.10 = 10%)
    pub hr_elevation_ratio: f64,
    /// Fraction of baseline mean RMSSD below which today's RMSSD triggers a factor
    pub rmssd_drop_ratio: f64,
    /// Prior-day moderate-or-above activity minutes above which a factor triggers
    pub activity_minutes_threshold: f64,
    /// Sleep quality below which a factor triggers
    pub sleep_quality_threshold: f64,
    /// Factor point total at or above which risk is High
    pub high_points: u32,
    /// Factor point total at or above which risk is Moderate
    pub moderate_points: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            low_z_threshold: -1.0,
            sustained_low_days: 3,
            hr_elevation_ratio: 0.10,
            rmssd_drop_ratio: 0.75,
            activity_minutes_threshold: 60.0,
            sleep_quality_threshold: 60.0,
            high_points: 6,
            moderate_points: 4,
        }
    }
}

/// Top-level configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validator: ValidatorConfig,
    pub spectral: SpectralConfig,
    pub baseline: BaselineConfig,
    pub scorer: ScorerConfig,
    pub risk: RiskConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_spec_values() {
        let config = EngineConfig::default();
        assert_eq!(config.validator.min_intervals, 30);
        assert_eq!(config.baseline.window_days, 28);
        assert_eq!(config.baseline.min_days, 7);
        assert!((config.scorer.hrv_weight - 0.40).abs() < f64::EPSILON);
        assert_eq!(config.risk.high_points, 6);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let s = ScorerConfig::default();
        let sum = s.hrv_weight + s.rhr_weight + s.sleep_weight + s.stress_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"baseline": {"window_days": 14}}"#).unwrap();
        assert_eq!(config.baseline.window_days, 14);
        assert_eq!(config.baseline.min_days, 7);
        assert_eq!(config.validator.min_intervals, 30);
    }
}
