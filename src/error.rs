//! Error types for Pacewise

use thiserror::Error;

/// Errors that can occur in the readiness pipeline.
///
/// Only genuinely unusable input is an error. Recoverable conditions are
/// modeled as values instead: a baseline that is not ready yet is
/// [`BaselineOutcome::NotReady`](crate::types::BaselineOutcome) and a noisy
/// recording is a reading carrying [`DataQuality::Poor`](crate::types::DataQuality).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input: empty series, non-finite values, or too few intervals
    /// surviving artifact filtering. The caller must reject the submission.
    #[error("Invalid interval series: {0}")]
    Validation(String),

    /// Not enough data for the requested computation. Partial results remain
    /// available to the caller (e.g. time-domain metrics without a spectrum).
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// State serialization failure
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
