//! Composite readiness scoring
//!
//! Normalizes today's metrics against the active baseline and fuses four
//! components — HRV, resting heart rate, sleep, stress — into a single 0-100
//! readiness value with a pacing recommendation. A missing or degenerate
//! baseline never blocks scoring: affected components fall back to the
//! neutral midpoint so the user always sees some score.

use crate::baseline::{hr_z_score, hrv_z_score};
use crate::config::EngineConfig;
use crate::risk::{assess_pem_risk, TodaySnapshot};
use crate::types::{
    ActivityRecommendation, Baseline, DailyInputs, HrvReading, PemRiskLevel, ReadinessScore,
};
use chrono::{NaiveDate, Utc};

/// Neutral component score used when a baseline comparison is unavailable.
const NEUTRAL: f64 = 50.0;

/// Compute the readiness score for one day.
///
/// `recent` is the user's prior score history (latest version per date),
/// consulted only by the embedded PEM risk assessment. The returned score has
/// `version: 1`; callers managing versioned per-date history bump it on
/// resubmission.
pub fn compute_readiness(
    date: NaiveDate,
    reading: &HrvReading,
    baseline: Option<&Baseline>,
    inputs: &DailyInputs,
    recent: &[ReadinessScore],
    config: &EngineConfig,
) -> ReadinessScore {
    let hrv_z = baseline.and_then(|b| hrv_z_score(reading.time.rmssd_ms, b));
    let rhr_z = baseline.and_then(|b| hr_z_score(reading.time.mean_hr_bpm, b));

    let hrv_score = hrv_component(reading, baseline, hrv_z, config);
    let rhr_score = rhr_component(reading, baseline);
    let sleep_score = inputs.sleep_quality.unwrap_or(NEUTRAL).clamp(0.0, 100.0);
    let stress_score = (100.0 - inputs.stress_level.unwrap_or(NEUTRAL)).clamp(0.0, 100.0);

    let weights = &config.scorer;
    let overall = (hrv_score * weights.hrv_weight
        + rhr_score * weights.rhr_weight
        + sleep_score * weights.sleep_weight
        + stress_score * weights.stress_weight)
        .clamp(0.0, 100.0);

    let risk = assess_pem_risk(
        recent,
        &TodaySnapshot {
            date,
            hrv_z,
            mean_hr_bpm: reading.time.mean_hr_bpm,
            rmssd_ms: reading.time.rmssd_ms,
        },
        baseline,
        inputs,
        &config.risk,
    );

    let recommendation = recommend(overall, risk.level);

    ReadinessScore {
        date,
        version: 1,
        computed_at: Utc::now(),
        hrv_score,
        rhr_score,
        sleep_score,
        stress_score,
        hrv_z,
        rhr_z,
        overall,
        pem_risk: risk.level,
        consecutive_low_days: risk.consecutive_low_days,
        recommendation,
    }
}

/// HRV component: z-score of ln(RMSSD) combined with today's HF power
/// relative to the baseline mean, mapped onto the 0-100 scale.
fn hrv_component(
    reading: &HrvReading,
    baseline: Option<&Baseline>,
    hrv_z: Option<f64>,
    config: &EngineConfig,
) -> f64 {
    let Some(z) = hrv_z else {
        return NEUTRAL;
    };

    let hf_factor = baseline
        .and_then(|b| b.mean_hf_power)
        .filter(|&mean_hf| mean_hf > 0.0)
        .and_then(|mean_hf| {
            reading
                .frequency
                .as_ref()
                .map(|f| f.hf_power / mean_hf)
        });

    let deviation = match hf_factor {
        Some(factor) => (z + factor) / 2.0,
        None => z,
    };

    (NEUTRAL + config.scorer.z_gain * deviation).clamp(0.0, 100.0)
}

/// RHR component: relative deviation from baseline resting heart rate,
/// lower heart rate scoring higher.
fn rhr_component(reading: &HrvReading, baseline: Option<&Baseline>) -> f64 {
    match baseline.filter(|b| b.mean_hr > 0.0) {
        Some(b) => {
            let relative = (b.mean_hr - reading.time.mean_hr_bpm) / b.mean_hr;
            (NEUTRAL + 100.0 * relative).clamp(0.0, 100.0)
        }
        None => NEUTRAL,
    }
}

/// Deterministic pacing recommendation from overall score and PEM risk.
pub fn recommend(overall: f64, risk: PemRiskLevel) -> ActivityRecommendation {
    if risk == PemRiskLevel::High {
        return ActivityRecommendation::Rest;
    }
    if overall >= 70.0 {
        ActivityRecommendation::Normal
    } else if overall >= 50.0 {
        ActivityRecommendation::Light
    } else if overall >= 30.0 {
        ActivityRecommendation::Reduced
    } else {
        ActivityRecommendation::Rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactStats, DataQuality, FrequencyDomain, TimeDomain};
    use chrono::Utc;
    use uuid::Uuid;

    fn make_reading(rmssd: f64, hr: f64, hf: Option<f64>) -> HrvReading {
        HrvReading {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            time: TimeDomain {
                mean_rr_ms: 60_000.0 / hr,
                mean_hr_bpm: hr,
                sdnn_ms: rmssd,
                rmssd_ms: rmssd,
                pnn50_pct: 10.0,
            },
            frequency: hf.map(|hf_power| FrequencyDomain {
                vlf_power: 300.0,
                lf_power: 900.0,
                hf_power,
                total_power: 1200.0 + hf_power,
                lf_hf_ratio: Some(900.0 / hf_power),
                lf_nu: None,
                hf_nu: None,
            }),
            artifacts: ArtifactStats {
                total: 400,
                kept: 396,
                rejected: 4,
                rejection_ratio: 0.01,
                span_secs: 330.0,
            },
            sleep: None,
            quality: DataQuality::Good,
        }
    }

    fn make_baseline() -> Baseline {
        Baseline {
            window_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2024, 3, 28).unwrap(),
            day_count: 28,
            mean_ln_rmssd: 50.0_f64.ln(),
            sd_ln_rmssd: 0.2,
            mean_rmssd: 50.0,
            mean_hr: 65.0,
            sd_hr: 2.0,
            mean_hf_power: Some(600.0),
            mean_lf_power: Some(900.0),
            mean_total_power: Some(2000.0),
        }
    }

    fn score(rmssd: f64, hr: f64) -> ReadinessScore {
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        compute_readiness(
            date,
            &make_reading(rmssd, hr, None),
            Some(&make_baseline()),
            &DailyInputs::default(),
            &[],
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_overall_monotone_in_rmssd() {
        let mut prev = f64::NEG_INFINITY;
        for rmssd in [20.0, 35.0, 50.0, 65.0, 80.0] {
            let s = score(rmssd, 65.0);
            assert!(
                s.overall >= prev,
                "overall dropped from {prev} at rmssd {rmssd}"
            );
            prev = s.overall;
        }
    }

    #[test]
    fn test_overall_monotone_in_heart_rate() {
        let mut prev = f64::INFINITY;
        for hr in [55.0, 62.0, 65.0, 72.0, 80.0] {
            let s = score(50.0, hr);
            assert!(s.overall <= prev, "overall rose from {prev} at hr {hr}");
            prev = s.overall;
        }
    }

    #[test]
    fn test_at_baseline_is_neutral() {
        let s = score(50.0, 65.0);
        assert!((s.hrv_score - 50.0).abs() < 1e-9);
        assert!((s.rhr_score - 50.0).abs() < 1e-9);
        assert!(s.hrv_z.unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_no_baseline_falls_back_to_neutral() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let s = compute_readiness(
            date,
            &make_reading(50.0, 65.0, None),
            None,
            &DailyInputs::default(),
            &[],
            &EngineConfig::default(),
        );
        assert_eq!(s.hrv_score, 50.0);
        assert_eq!(s.rhr_score, 50.0);
        assert!(s.hrv_z.is_none());
        assert!(s.rhr_z.is_none());
    }

    #[test]
    fn test_zero_variance_baseline_is_neutral_not_division() {
        let mut baseline = make_baseline();
        baseline.sd_ln_rmssd = 0.0;
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let s = compute_readiness(
            date,
            &make_reading(30.0, 65.0, None),
            Some(&baseline),
            &DailyInputs::default(),
            &[],
            &EngineConfig::default(),
        );
        assert!(s.hrv_z.is_none());
        assert_eq!(s.hrv_score, 50.0);
    }

    #[test]
    fn test_hf_factor_lifts_hrv_component() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        // HF at baseline parity contributes a factor of 1.0; with z = 0 the
        // component becomes 50 + 20·(0+1)/2 = 60
        let s = compute_readiness(
            date,
            &make_reading(50.0, 65.0, Some(600.0)),
            Some(&make_baseline()),
            &DailyInputs::default(),
            &[],
            &EngineConfig::default(),
        );
        assert!((s.hrv_score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_sleep_and_stress_passthrough() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let inputs = DailyInputs {
            sleep_quality: Some(85.0),
            stress_level: Some(20.0),
            prior_day_activity_minutes: None,
        };
        let s = compute_readiness(
            date,
            &make_reading(50.0, 65.0, None),
            Some(&make_baseline()),
            &inputs,
            &[],
            &EngineConfig::default(),
        );
        assert_eq!(s.sleep_score, 85.0);
        assert_eq!(s.stress_score, 80.0);
        // 0.4·50 + 0.3·50 + 0.2·85 + 0.1·80 = 60
        assert!((s.overall - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommendation_mapping() {
        assert_eq!(recommend(75.0, PemRiskLevel::Low), ActivityRecommendation::Normal);
        assert_eq!(recommend(70.0, PemRiskLevel::Moderate), ActivityRecommendation::Normal);
        assert_eq!(recommend(69.9, PemRiskLevel::Low), ActivityRecommendation::Light);
        assert_eq!(recommend(50.0, PemRiskLevel::Low), ActivityRecommendation::Light);
        assert_eq!(recommend(49.9, PemRiskLevel::Low), ActivityRecommendation::Reduced);
        assert_eq!(recommend(30.0, PemRiskLevel::Low), ActivityRecommendation::Reduced);
        assert_eq!(recommend(29.9, PemRiskLevel::Low), ActivityRecommendation::Rest);
        // High PEM risk forces rest regardless of score
        assert_eq!(recommend(90.0, PemRiskLevel::High), ActivityRecommendation::Rest);
    }
}
