//! Rolling baseline computation
//!
//! Maintains the 28-day personal reference used to normalize daily metrics.
//! The per-day HRV value is ln(RMSSD) — the log transform stabilizes the
//! right-skewed RMSSD distribution — and the per-day RHR value is mean heart
//! rate. Recomputation is explicit and a pure read of history: it never
//! mutates the readings and identical history yields an identical baseline.

use crate::config::BaselineConfig;
use crate::types::{Baseline, BaselineOutcome, HrvReading};
use chrono::{Days, NaiveDate};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-day aggregate of possibly multiple same-day readings.
#[derive(Debug, Clone)]
struct DayAggregate {
    rmssd: f64,
    hr: f64,
    hf: Option<f64>,
    lf: Option<f64>,
    total: Option<f64>,
}

/// Recompute the rolling baseline from a user's reading history.
///
/// The window covers the most recent `window_days` calendar days ending at
/// the newest reading's date. Multiple readings on one day are averaged into
/// a single per-day value before statistics are taken. Fewer than `min_days`
/// distinct days yields [`BaselineOutcome::NotReady`] rather than an
/// unstable reference.
pub fn recompute_baseline(history: &[HrvReading], config: &BaselineConfig) -> BaselineOutcome {
    let Some(window_end) = history.iter().map(|r| r.recorded_at.date_naive()).max() else {
        return BaselineOutcome::NotReady {
            days_available: 0,
            days_required: config.min_days as u32,
        };
    };
    let window_start = window_end
        .checked_sub_days(Days::new(config.window_days.saturating_sub(1) as u64))
        .unwrap_or(window_end);

    let days = aggregate_by_day(history, window_start, window_end);

    // ln(RMSSD) is undefined for zero-variability days; they cannot
    // contribute to the reference
    let ln_rmssd: Vec<f64> = days
        .values()
        .filter(|d| d.rmssd > 0.0)
        .map(|d| d.rmssd.ln())
        .collect();

    if ln_rmssd.len() < config.min_days {
        debug!(
            days_available = ln_rmssd.len(),
            days_required = config.min_days,
            "baseline not ready"
        );
        return BaselineOutcome::NotReady {
            days_available: ln_rmssd.len() as u32,
            days_required: config.min_days as u32,
        };
    }

    let rmssd: Vec<f64> = days.values().filter(|d| d.rmssd > 0.0).map(|d| d.rmssd).collect();
    let hr: Vec<f64> = days.values().map(|d| d.hr).collect();
    let hf: Vec<f64> = days.values().filter_map(|d| d.hf).collect();
    let lf: Vec<f64> = days.values().filter_map(|d| d.lf).collect();
    let total: Vec<f64> = days.values().filter_map(|d| d.total).collect();

    BaselineOutcome::Ready(Baseline {
        window_start,
        window_end,
        day_count: ln_rmssd.len() as u32,
        mean_ln_rmssd: ln_rmssd.iter().mean(),
        sd_ln_rmssd: sample_sd(&ln_rmssd),
        mean_rmssd: rmssd.iter().mean(),
        mean_hr: hr.iter().mean(),
        sd_hr: sample_sd(&hr),
        mean_hf_power: mean_if_any(&hf),
        mean_lf_power: mean_if_any(&lf),
        mean_total_power: mean_if_any(&total),
    })
}

fn aggregate_by_day(
    history: &[HrvReading],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> BTreeMap<NaiveDate, DayAggregate> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&HrvReading>> = BTreeMap::new();
    for reading in history {
        let date = reading.recorded_at.date_naive();
        if date >= window_start && date <= window_end {
            buckets.entry(date).or_default().push(reading);
        }
    }

    buckets
        .into_iter()
        .map(|(date, readings)| {
            let rmssd = readings.iter().map(|r| r.time.rmssd_ms).mean();
            let hr = readings.iter().map(|r| r.time.mean_hr_bpm).mean();
            let hf = mean_if_any(
                &readings
                    .iter()
                    .filter_map(|r| r.frequency.as_ref().map(|f| f.hf_power))
                    .collect::<Vec<_>>(),
            );
            let lf = mean_if_any(
                &readings
                    .iter()
                    .filter_map(|r| r.frequency.as_ref().map(|f| f.lf_power))
                    .collect::<Vec<_>>(),
            );
            let total = mean_if_any(
                &readings
                    .iter()
                    .filter_map(|r| r.frequency.as_ref().map(|f| f.total_power))
                    .collect::<Vec<_>>(),
            );
            (date, DayAggregate { rmssd, hr, hf, lf, total })
        })
        .collect()
}

/// Sample standard deviation (n−1); zero for a single value.
fn sample_sd(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().std_dev()
}

fn mean_if_any(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// HRV z-score of a reading against the baseline: (ln(RMSSD) − mean) / SD.
/// None when RMSSD is non-positive or the baseline has zero variance.
pub fn hrv_z_score(rmssd_ms: f64, baseline: &Baseline) -> Option<f64> {
    if rmssd_ms <= 0.0 || baseline.sd_ln_rmssd <= 0.0 {
        return None;
    }
    Some((rmssd_ms.ln() - baseline.mean_ln_rmssd) / baseline.sd_ln_rmssd)
}

/// Heart-rate z-score against the baseline. Positive means elevated.
pub fn hr_z_score(hr_bpm: f64, baseline: &Baseline) -> Option<f64> {
    if baseline.sd_hr <= 0.0 {
        return None;
    }
    Some((hr_bpm - baseline.mean_hr) / baseline.sd_hr)
}
