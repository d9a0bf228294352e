//! Core types for the Pacewise pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: interval series, extracted readings, baselines, readiness scores,
//! and relapse-risk assessments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sleep context attached to an interval series by the submitting device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepContext {
    /// Sleep duration (hours)
    pub duration_hours: Option<f64>,
    /// Sleep quality score (0-100)
    pub quality: Option<f64>,
}

/// Ordered beat-to-beat interval recording for a single reading.
///
/// Immutable after validation; all later computations reference the derived
/// [`HrvReading`] rather than the raw series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalSeries {
    /// Timestamp anchor for the recording (start of recording, UTC)
    pub recorded_at: DateTime<Utc>,
    /// Beat-to-beat durations (ms), in recording order
    pub intervals_ms: Vec<f64>,
    /// Optional sleep context from the submitting device
    pub sleep: Option<SleepContext>,
}

impl IntervalSeries {
    pub fn new(recorded_at: DateTime<Utc>, intervals_ms: Vec<f64>) -> Self {
        Self {
            recorded_at,
            intervals_ms,
            sleep: None,
        }
    }

    pub fn with_sleep(mut self, sleep: SleepContext) -> Self {
        self.sleep = Some(sleep);
        self
    }
}

/// Overall quality classification for an extracted reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// Artifact rate within limits and spectrum available
    Good,
    /// Artifact rejection exceeded the configured ceiling; metrics returned
    /// but the caller should weigh whether to persist them
    Poor,
    /// Series too short (or span too brief) for spectral estimation;
    /// time-domain metrics only
    Insufficient,
}

/// Time-domain HRV metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDomain {
    /// Mean beat interval (ms)
    pub mean_rr_ms: f64,
    /// Mean heart rate (bpm), 60000 / mean interval
    pub mean_hr_bpm: f64,
    /// Sample standard deviation of intervals (ms)
    pub sdnn_ms: f64,
    /// Root mean square of successive differences (ms)
    pub rmssd_ms: f64,
    /// Percentage of successive differences exceeding 50 ms
    pub pnn50_pct: f64,
}

/// Frequency-domain HRV metrics from the interval-series spectrum.
///
/// Present on a reading only when the cleaned series met the spectral
/// minimum length and recording span requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDomain {
    /// Very-low-frequency power (ms²)
    pub vlf_power: f64,
    /// Low-frequency power (ms²)
    pub lf_power: f64,
    /// High-frequency power (ms²)
    pub hf_power: f64,
    /// Total power, VLF + LF + HF (ms²)
    pub total_power: f64,
    /// LF/HF ratio; None when HF power is effectively zero
    pub lf_hf_ratio: Option<f64>,
    /// LF in normalized units, LF / (total − VLF) × 100
    pub lf_nu: Option<f64>,
    /// HF in normalized units, HF / (total − VLF) × 100
    pub hf_nu: Option<f64>,
}

/// Artifact filtering statistics, kept as a quality signal on the reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStats {
    /// Intervals in the raw submission
    pub total: usize,
    /// Intervals surviving filtering
    pub kept: usize,
    /// Intervals dropped as artifacts
    pub rejected: usize,
    /// rejected / total
    pub rejection_ratio: f64,
    /// Real time spanned by the raw recording (seconds)
    pub span_secs: f64,
}

/// Derived metrics for one interval series. Never mutated after extraction;
/// later stages reference it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrvReading {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub time: TimeDomain,
    /// None when the series did not meet spectral requirements
    pub frequency: Option<FrequencyDomain>,
    pub artifacts: ArtifactStats,
    pub sleep: Option<SleepContext>,
    pub quality: DataQuality,
}

/// Rolling 28-day statistical reference for one user.
///
/// Fully determined by the reading history it was computed from, so
/// recomputation over unchanged history is bit-identical. Snapshot identity
/// (id, timestamp) is attached by [`BaselineSnapshot`] when a recomputation
/// is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// First calendar day of the window
    pub window_start: NaiveDate,
    /// Last calendar day of the window (date of the newest reading)
    pub window_end: NaiveDate,
    /// Distinct days with readings inside the window
    pub day_count: u32,
    /// Mean of per-day ln(RMSSD)
    pub mean_ln_rmssd: f64,
    /// Sample standard deviation of per-day ln(RMSSD)
    pub sd_ln_rmssd: f64,
    /// Mean of per-day RMSSD (ms)
    pub mean_rmssd: f64,
    /// Mean of per-day heart rate (bpm)
    pub mean_hr: f64,
    /// Sample standard deviation of per-day heart rate
    pub sd_hr: f64,
    /// Mean per-day HF power over days with a spectrum (ms²)
    pub mean_hf_power: Option<f64>,
    /// Mean per-day LF power over days with a spectrum (ms²)
    pub mean_lf_power: Option<f64>,
    /// Mean per-day total power over days with a spectrum (ms²)
    pub mean_total_power: Option<f64>,
}

/// A persisted baseline recomputation. Snapshots are append-only: the active
/// baseline is simply the most recent snapshot, and older ones remain for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub id: Uuid,
    pub computed_at: DateTime<Utc>,
    pub baseline: Baseline,
}

impl BaselineSnapshot {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            id: Uuid::new_v4(),
            computed_at: Utc::now(),
            baseline,
        }
    }
}

/// Result of a baseline recomputation. Not-ready is a defined state,
/// not an error: downstream scoring falls back to neutral components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BaselineOutcome {
    Ready(Baseline),
    NotReady {
        days_available: u32,
        days_required: u32,
    },
}

impl BaselineOutcome {
    /// The baseline, if ready.
    pub fn ready(&self) -> Option<&Baseline> {
        match self {
            BaselineOutcome::Ready(b) => Some(b),
            BaselineOutcome::NotReady { .. } => None,
        }
    }
}

/// Post-exertional malaise risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PemRiskLevel {
    Low,
    Moderate,
    High,
}

/// Individual relapse-warning factors, kept on the assessment for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// HRV z-score at or below threshold for the configured run of days
    SustainedLowHrv,
    /// Today's heart rate elevated beyond the baseline RHR margin
    ElevatedHeartRate,
    /// Today's RMSSD below the configured fraction of baseline mean
    DepressedRmssd,
    /// Prior-day activity volume above threshold
    PriorDayExertion,
    /// Today's sleep quality below threshold
    PoorSleep,
}

/// PEM risk assessment, derived fresh each run from stored history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PemRisk {
    pub level: PemRiskLevel,
    /// Days (including today) with HRV z-score at or below the low threshold
    pub consecutive_low_days: u32,
    /// Triggered factors
    pub factors: Vec<RiskFactor>,
    /// Accumulated factor points
    pub points: u32,
}

/// Activity pacing recommendation derived from the overall score and PEM risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityRecommendation {
    Normal,
    Light,
    Reduced,
    Rest,
}

/// Externally sourced daily context consumed by the scorer and risk assessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyInputs {
    /// Sleep quality score (0-100) from the wearable integration
    pub sleep_quality: Option<f64>,
    /// Stress level (0-100) from the wearable integration
    pub stress_level: Option<f64>,
    /// Prior-day moderate-or-above activity minutes
    pub prior_day_activity_minutes: Option<f64>,
}

/// Per-day composite readiness result (the "energy budget").
///
/// Never recomputed in place: a new submission for the same date produces a
/// new version, superseding but not deleting the prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessScore {
    pub date: NaiveDate,
    /// Version for this (user, date); resubmission bumps it
    pub version: u32,
    pub computed_at: DateTime<Utc>,
    /// HRV component score (0-100)
    pub hrv_score: f64,
    /// Resting-heart-rate component score (0-100)
    pub rhr_score: f64,
    /// Sleep component score (0-100)
    pub sleep_score: f64,
    /// Stress component score (0-100)
    pub stress_score: f64,
    /// ln(RMSSD) z-score against baseline; None when the baseline was not
    /// ready or had zero variance
    pub hrv_z: Option<f64>,
    /// Heart-rate z-score against baseline
    pub rhr_z: Option<f64>,
    /// Weighted overall score (0-100)
    pub overall: f64,
    pub pem_risk: PemRiskLevel,
    pub consecutive_low_days: u32,
    pub recommendation: ActivityRecommendation,
}
