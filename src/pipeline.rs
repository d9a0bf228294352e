//! Pipeline orchestration
//!
//! This module provides the public API for Pacewise. It wires the stages
//! together — extract → baseline → score → risk — and offers:
//!
//! - [`score_interval_history`]: pure batch processing of daily submissions
//! - [`ReadinessProcessor`]: stateful per-user engine with explicit baseline
//!   recomputation, versioned per-date scores, and JSON state persistence
//! - [`UserRegistry`]: per-user serialization for callers handling many users

use crate::baseline::recompute_baseline;
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::metrics::extract_metrics;
use crate::scorer::compute_readiness;
use crate::types::{
    BaselineOutcome, BaselineSnapshot, DailyInputs, HrvReading, IntervalSeries, ReadinessScore,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// One day's submission: the raw interval recording plus the externally
/// sourced daily context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySubmission {
    pub series: IntervalSeries,
    #[serde(default)]
    pub inputs: DailyInputs,
}

/// Process a batch of daily submissions through the full pipeline.
///
/// For each day the baseline is recomputed from the readings *before* that
/// day, so the reference lags the day being scored and a single bad night
/// cannot normalize itself away. Returns one score per submission, in order.
pub fn score_interval_history(
    days: &[DailySubmission],
    config: &EngineConfig,
) -> Result<Vec<ReadinessScore>, CoreError> {
    let mut readings: Vec<HrvReading> = Vec::with_capacity(days.len());
    let mut scores: Vec<ReadinessScore> = Vec::with_capacity(days.len());

    for submission in days {
        let reading = extract_metrics(&submission.series, config)?;
        let outcome = recompute_baseline(&readings, &config.baseline);
        let date = reading.recorded_at.date_naive();

        let score = compute_readiness(
            date,
            &reading,
            outcome.ready(),
            &submission.inputs,
            &scores,
            config,
        );

        readings.push(reading);
        scores.push(score);
    }

    Ok(scores)
}

/// Stateful per-user readiness engine.
///
/// Holds one user's reading history, baseline snapshots, and score history.
/// Baseline recomputation is explicit — triggered by the caller, never as a
/// side effect of a submission — and each recomputation appends a new
/// immutable snapshot; the active baseline is simply the most recent one.
/// Same-date score resubmissions create a new version, superseding but never
/// deleting the prior score.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessProcessor {
    config: EngineConfig,
    readings: Vec<HrvReading>,
    baselines: Vec<BaselineSnapshot>,
    scores: Vec<ReadinessScore>,
}

impl Default for ReadinessProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessProcessor {
    /// Create a processor with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            readings: Vec::new(),
            baselines: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Validate a series, extract its metrics, and record the reading.
    pub fn submit_reading(&mut self, series: &IntervalSeries) -> Result<HrvReading, CoreError> {
        let reading = extract_metrics(series, &self.config)?;
        // History stays ordered by recording time even for backfills
        let position = self
            .readings
            .partition_point(|r| r.recorded_at <= reading.recorded_at);
        self.readings.insert(position, reading.clone());
        Ok(reading)
    }

    /// Explicitly recompute the rolling baseline from stored readings.
    ///
    /// A ready result is appended as a new snapshot and becomes active;
    /// a not-ready result leaves the prior active baseline in place.
    pub fn recompute_baseline(&mut self) -> BaselineOutcome {
        let outcome = recompute_baseline(&self.readings, &self.config.baseline);
        if let BaselineOutcome::Ready(baseline) = &outcome {
            debug!(
                day_count = baseline.day_count,
                mean_rmssd = baseline.mean_rmssd,
                "baseline recomputed"
            );
            self.baselines.push(BaselineSnapshot::new(baseline.clone()));
        }
        outcome
    }

    /// The currently active baseline snapshot, if any.
    pub fn active_baseline(&self) -> Option<&BaselineSnapshot> {
        self.baselines.last()
    }

    /// Score a day using its most recent reading, the active baseline, and
    /// the supplied daily context. Scoring the same date again produces a
    /// new version.
    pub fn score_day(
        &mut self,
        date: NaiveDate,
        inputs: &DailyInputs,
    ) -> Result<ReadinessScore, CoreError> {
        let reading = self
            .readings
            .iter()
            .rev()
            .find(|r| r.recorded_at.date_naive() == date)
            .cloned()
            .ok_or_else(|| {
                CoreError::InsufficientData(format!("no reading recorded on {date}"))
            })?;

        let baseline = self.baselines.last().map(|s| &s.baseline);
        let mut score =
            compute_readiness(date, &reading, baseline, inputs, &self.scores, &self.config);

        score.version = self
            .scores
            .iter()
            .filter(|s| s.date == date)
            .map(|s| s.version)
            .max()
            .unwrap_or(0)
            + 1;

        self.scores.push(score.clone());
        Ok(score)
    }

    pub fn readings(&self) -> &[HrvReading] {
        &self.readings
    }

    /// All baseline snapshots, oldest first (audit trail).
    pub fn baseline_history(&self) -> &[BaselineSnapshot] {
        &self.baselines
    }

    /// All score versions, in computation order.
    pub fn scores(&self) -> &[ReadinessScore] {
        &self.scores
    }

    /// The superseding score for each date (latest version).
    pub fn canonical_scores(&self) -> Vec<&ReadinessScore> {
        let mut latest: HashMap<NaiveDate, &ReadinessScore> = HashMap::new();
        for score in &self.scores {
            match latest.get(&score.date) {
                Some(existing) if existing.version >= score.version => {}
                _ => {
                    latest.insert(score.date, score);
                }
            }
        }
        let mut scores: Vec<&ReadinessScore> = latest.into_values().collect();
        scores.sort_by_key(|s| s.date);
        scores
    }

    /// Serialize full processor state to JSON.
    pub fn save_state(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a processor from previously saved state.
    pub fn load_state(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Per-user processor registry.
///
/// Operations on one user are serialized through that user's lock, so a
/// baseline recomputation and a same-day submission can never race to become
/// canonical; different users proceed fully in parallel.
pub struct UserRegistry {
    config: EngineConfig,
    users: Mutex<HashMap<Uuid, Arc<Mutex<ReadinessProcessor>>>>,
}

impl UserRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against one user's processor, holding that user's lock for
    /// the duration.
    pub fn with_user<R>(&self, user_id: Uuid, f: impl FnOnce(&mut ReadinessProcessor) -> R) -> R {
        let processor = {
            let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
            users
                .entry(user_id)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(ReadinessProcessor::with_config(
                        self.config.clone(),
                    )))
                })
                .clone()
        };
        let mut guard = processor.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}
