//! PEM risk assessment
//!
//! Scans recent score history plus today's metrics for relapse-warning
//! patterns. The assessment is recomputed from stored history on every run —
//! including the consecutive-low-day counter — so corrected or backfilled
//! records can never leave a stale incremental counter behind.

use crate::config::RiskConfig;
use crate::types::{
    Baseline, DailyInputs, PemRisk, PemRiskLevel, ReadinessScore, RiskFactor,
};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Today's freshly computed metrics, as consumed by the risk assessor.
#[derive(Debug, Clone)]
pub struct TodaySnapshot {
    pub date: NaiveDate,
    /// HRV z-score; None when the baseline was not usable
    pub hrv_z: Option<f64>,
    pub mean_hr_bpm: f64,
    pub rmssd_ms: f64,
}

/// Assess PEM risk from recent history and today's metrics.
///
/// Factors accumulate points; they are not mutually exclusive. History
/// shorter than the lookback window simply leaves multi-day factors
/// untriggered — partial history degrades confidence but never fails.
pub fn assess_pem_risk(
    recent: &[ReadinessScore],
    today: &TodaySnapshot,
    baseline: Option<&Baseline>,
    inputs: &DailyInputs,
    config: &RiskConfig,
) -> PemRisk {
    let consecutive_low_days = consecutive_low_days(recent, today, config);

    let mut factors = Vec::new();
    let mut points = 0u32;

    if consecutive_low_days >= config.sustained_low_days {
        factors.push(RiskFactor::SustainedLowHrv);
        points += 2;
    }

    if let Some(b) = baseline {
        if b.mean_hr > 0.0 && today.mean_hr_bpm > b.mean_hr * (1.0 + config.hr_elevation_ratio) {
            factors.push(RiskFactor::ElevatedHeartRate);
            points += 2;
        }
        if today.rmssd_ms < b.mean_rmssd * config.rmssd_drop_ratio {
            factors.push(RiskFactor::DepressedRmssd);
            points += 2;
        }
    }

    if let Some(minutes) = inputs.prior_day_activity_minutes {
        if minutes > config.activity_minutes_threshold {
            factors.push(RiskFactor::PriorDayExertion);
            points += 1;
        }
    }

    if let Some(quality) = inputs.sleep_quality {
        if quality < config.sleep_quality_threshold {
            factors.push(RiskFactor::PoorSleep);
            points += 1;
        }
    }

    let level = if points >= config.high_points {
        PemRiskLevel::High
    } else if points >= config.moderate_points {
        PemRiskLevel::Moderate
    } else {
        PemRiskLevel::Low
    };

    if level != PemRiskLevel::Low {
        debug!(?level, points, ?factors, "elevated PEM risk");
    }

    PemRisk {
        level,
        consecutive_low_days,
        factors,
        points,
    }
}

/// Stateless scan for the run of low-HRV days ending today.
///
/// Walks backward day by day from today, requiring calendar continuity; a
/// missing day or a day above the threshold ends the run. Only the latest
/// version of each date's score is consulted.
fn consecutive_low_days(
    recent: &[ReadinessScore],
    today: &TodaySnapshot,
    config: &RiskConfig,
) -> u32 {
    let is_low = |z: Option<f64>| z.is_some_and(|z| z <= config.low_z_threshold);

    if !is_low(today.hrv_z) {
        return 0;
    }

    // Latest version per date wins
    let mut by_date: BTreeMap<NaiveDate, &ReadinessScore> = BTreeMap::new();
    for score in recent {
        if score.date >= today.date {
            continue;
        }
        match by_date.get(&score.date) {
            Some(existing) if existing.version >= score.version => {}
            _ => {
                by_date.insert(score.date, score);
            }
        }
    }

    let horizon = today
        .date
        .checked_sub_days(Days::new(config.lookback_days as u64))
        .unwrap_or(today.date);

    let mut count = 1u32;
    let mut expected = today.date.checked_sub_days(Days::new(1));
    while let Some(date) = expected {
        if date < horizon {
            break;
        }
        match by_date.get(&date) {
            Some(score) if is_low(score.hrv_z) => {
                count += 1;
                expected = date.checked_sub_days(Days::new(1));
            }
            _ => break,
        }
    }

    count
}
