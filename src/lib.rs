//! Pacewise - Physiological readiness engine for ME/CFS pacing
//!
//! Pacewise turns raw beat-to-beat heart interval recordings into a daily
//! 0-100 readiness score through a deterministic pipeline: artifact
//! filtering → metric extraction → rolling baseline normalization →
//! component fusion → PEM risk assessment.
//!
//! ## Modules
//!
//! - **Metric extraction**: Clean interval series and derive time- and
//!   frequency-domain HRV metrics
//! - **Baseline**: 28-day rolling personal reference over ln(RMSSD) and
//!   resting heart rate
//! - **Scoring**: Readiness fusion, PEM risk factors, and pacing
//!   recommendations

pub mod baseline;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod risk;
pub mod scorer;
pub mod spectral;
pub mod types;
pub mod validator;

pub use error::CoreError;
pub use pipeline::{score_interval_history, DailySubmission, ReadinessProcessor, UserRegistry};

// Stage exports
pub use baseline::{hr_z_score, hrv_z_score, recompute_baseline};
pub use metrics::extract_metrics;
pub use risk::{assess_pem_risk, TodaySnapshot};
pub use scorer::{compute_readiness, recommend};
pub use validator::clean_series;

// Core data types
pub use config::EngineConfig;
pub use types::{
    ActivityRecommendation, Baseline, BaselineOutcome, BaselineSnapshot, DailyInputs,
    DataQuality, HrvReading, IntervalSeries, PemRisk, PemRiskLevel, ReadinessScore,
    SleepContext,
};

/// Engine version embedded in exported payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exported payloads
pub const PRODUCER_NAME: &str = "pacewise";
