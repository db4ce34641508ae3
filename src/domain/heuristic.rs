//! Local risk estimation used when the prediction service is unreachable.
//!
//! Each rule contributes independently; contributions are summed, a bounded
//! jitter is added and the total is clamped to [`MIN_SCORE`, `MAX_SCORE`].
//! The estimator is pure: randomness is supplied by the caller.

use super::features::{Feature, FeatureVector};
use super::patient::{ChestPain, PatientRecord, Sex, Thalassemia};
use super::prediction::RiskFactor;

/// Lowest score the estimator reports, in percent.
pub const MIN_SCORE: f64 = 1.0;
/// Highest score the estimator reports, in percent.
pub const MAX_SCORE: f64 = 99.0;
/// Jitter is drawn from `[-JITTER_AMPLITUDE, JITTER_AMPLITUDE)`.
pub const JITTER_AMPLITUDE: f64 = 5.0;
/// Largest jitter accepted; keeps the upper bound open at score resolution.
const JITTER_CEILING: f64 = JITTER_AMPLITUDE - 1e-9;

/// Score (percent, within [1, 99]) and the factors that contributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskEstimate {
    pub score: f64,
    pub factors: Vec<RiskFactor>,
}

/// Estimate risk from an encoded feature vector.
///
/// `jitter` is clamped to `[-JITTER_AMPLITUDE, JITTER_AMPLITUDE)`; pass `0.0` for a
/// deterministic score.
#[must_use]
pub fn estimate_risk(vector: &FeatureVector, jitter: f64) -> RiskEstimate {
    let mut score = 0.0;
    let mut factors = Vec::new();

    let age = vector.get(Feature::Age);
    if age > 55.0 {
        score += 10.0;
        factors.push(RiskFactor::Age);
    }
    if age > 65.0 {
        score += 15.0;
    }

    // Contributes to the score only; sex is not reported as a factor.
    if vector.get(Feature::Sex) == Sex::Male.code() as f64 {
        score += 5.0;
    }

    if vector.get(Feature::ChestPain) == ChestPain::TypicalAngina.code() as f64 {
        score += 20.0;
        factors.push(RiskFactor::ChestPain);
    }

    if vector.get(Feature::RestingBp) > 140.0 {
        score += 10.0;
        factors.push(RiskFactor::BloodPressure);
    }

    if vector.get(Feature::Cholesterol) > 240.0 {
        score += 15.0;
        factors.push(RiskFactor::Cholesterol);
    }

    if vector.is_set(Feature::FastingBloodSugar) {
        score += 5.0;
        factors.push(RiskFactor::FastingBloodSugar);
    }

    if vector.get(Feature::MaxHeartRate) < 120.0 {
        score += 10.0;
        factors.push(RiskFactor::MaxHeartRate);
    }

    if vector.is_set(Feature::ExerciseAngina) {
        score += 20.0;
        factors.push(RiskFactor::ExerciseAngina);
    }

    let vessels = vector.get(Feature::MajorVessels);
    score += vessels * 10.0;
    if vessels > 0.0 {
        factors.push(RiskFactor::MajorVessels);
    }

    if vector.get(Feature::Thalassemia) == Thalassemia::ReversibleDefect.code() as f64 {
        score += 15.0;
        factors.push(RiskFactor::Thalassemia);
    }

    let jitter = if jitter.is_finite() {
        jitter.clamp(-JITTER_AMPLITUDE, JITTER_CEILING)
    } else {
        0.0
    };
    score += jitter;

    RiskEstimate {
        score: score.clamp(MIN_SCORE, MAX_SCORE),
        factors,
    }
}

/// Lightweight factor pass over the record, used when the service answers
/// without its own factor list.
#[must_use]
pub fn record_risk_factors(record: &PatientRecord) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if record.age > 55 {
        factors.push(RiskFactor::Age);
    }
    if record.cholesterol > 240 {
        factors.push(RiskFactor::Cholesterol);
    }
    if record.resting_bp > 140 {
        factors.push(RiskFactor::BloodPressure);
    }
    if record.chest_pain == ChestPain::TypicalAngina {
        factors.push(RiskFactor::ChestPain);
    }
    if record.exercise_angina {
        factors.push(RiskFactor::ExerciseAngina);
    }
    if record.major_vessels > 0 {
        factors.push(RiskFactor::MajorVessels);
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::tests::sample_record;
    use crate::domain::patient::{RestingEcg, StSlope};

    fn healthy_record() -> PatientRecord {
        PatientRecord {
            age: 40,
            sex: Sex::Female,
            chest_pain: ChestPain::Asymptomatic,
            resting_bp: 120,
            cholesterol: 200,
            fasting_blood_sugar: false,
            resting_ecg: RestingEcg::Normal,
            max_heart_rate: 160,
            exercise_angina: false,
            st_depression: 0.0,
            st_slope: StSlope::Upsloping,
            major_vessels: 0,
            thalassemia: Thalassemia::Normal,
        }
    }

    fn high_risk_record() -> PatientRecord {
        PatientRecord {
            age: 60,
            sex: Sex::Male,
            chest_pain: ChestPain::TypicalAngina,
            resting_bp: 150,
            cholesterol: 260,
            fasting_blood_sugar: true,
            resting_ecg: RestingEcg::Normal,
            max_heart_rate: 100,
            exercise_angina: true,
            st_depression: 2.0,
            st_slope: StSlope::Flat,
            major_vessels: 2,
            thalassemia: Thalassemia::ReversibleDefect,
        }
    }

    fn encode(record: &PatientRecord) -> FeatureVector {
        FeatureVector::encode(record).expect("Test record should encode")
    }

    #[test]
    fn test_every_rule_fires_and_clamps_to_max() {
        let estimate = estimate_risk(&encode(&high_risk_record()), 0.0);

        assert_eq!(estimate.score, MAX_SCORE);
        assert_eq!(
            estimate.factors,
            vec![
                RiskFactor::Age,
                RiskFactor::ChestPain,
                RiskFactor::BloodPressure,
                RiskFactor::Cholesterol,
                RiskFactor::FastingBloodSugar,
                RiskFactor::MaxHeartRate,
                RiskFactor::ExerciseAngina,
                RiskFactor::MajorVessels,
                RiskFactor::Thalassemia,
            ]
        );
    }

    #[test]
    fn test_no_rule_fires_clamps_to_min() {
        let estimate = estimate_risk(&encode(&healthy_record()), 0.0);
        assert_eq!(estimate.score, MIN_SCORE);
        assert!(estimate.factors.is_empty());

        let jittered = estimate_risk(&encode(&healthy_record()), -4.9);
        assert_eq!(jittered.score, MIN_SCORE);
    }

    #[test]
    fn test_additive_contributions() {
        // age>55 (+10), male (+5), bp>140 (+10)
        let record = PatientRecord {
            age: 60,
            sex: Sex::Male,
            resting_bp: 150,
            ..healthy_record()
        };
        let vector = encode(&record);

        assert_eq!(estimate_risk(&vector, 0.0).score, 25.0);
        assert_eq!(estimate_risk(&vector, 3.0).score, 28.0);
        assert_eq!(estimate_risk(&vector, -5.0).score, 20.0);
        assert_eq!(
            estimate_risk(&vector, 0.0).factors,
            vec![RiskFactor::Age, RiskFactor::BloodPressure]
        );
    }

    #[test]
    fn test_age_rules_stack() {
        let record = PatientRecord {
            age: 70,
            ..healthy_record()
        };
        let estimate = estimate_risk(&encode(&record), 0.0);
        assert_eq!(estimate.score, 25.0);
        assert_eq!(estimate.factors, vec![RiskFactor::Age]);
    }

    #[test]
    fn test_vessels_are_additive_per_vessel() {
        let record = PatientRecord {
            major_vessels: 3,
            ..healthy_record()
        };
        assert_eq!(estimate_risk(&encode(&record), 0.0).score, 30.0);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let record = PatientRecord {
            age: 60,
            ..healthy_record()
        };
        let vector = encode(&record);
        let capped = estimate_risk(&vector, 50.0).score;
        assert!(capped < 15.0 && capped > 14.99, "{capped}");
        assert_eq!(estimate_risk(&vector, f64::NAN).score, 10.0);
    }

    #[test]
    fn test_jitter_upper_bound_is_open() {
        // age>55 (+10), male (+5)
        let record = PatientRecord {
            age: 60,
            sex: Sex::Male,
            ..healthy_record()
        };
        let vector = encode(&record);

        let score = estimate_risk(&vector, JITTER_AMPLITUDE).score;
        assert!(score < 20.0, "{score}");
        assert!(score > 19.99, "{score}");
        assert_eq!(estimate_risk(&vector, -JITTER_AMPLITUDE).score, 10.0);
    }

    #[test]
    fn test_identical_input_identical_output() {
        let vector = encode(&sample_record());
        assert_eq!(estimate_risk(&vector, 1.5), estimate_risk(&vector, 1.5));
    }

    #[test]
    fn test_score_always_in_bounds() {
        for age in [30, 56, 66, 90] {
            for vessels in 0..=3 {
                for jitter in [-5.0, -2.5, 0.0, 4.99] {
                    let record = PatientRecord {
                        age,
                        major_vessels: vessels,
                        ..high_risk_record()
                    };
                    let score = estimate_risk(&encode(&record), jitter).score;
                    assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_record_factor_pass() {
        assert_eq!(
            record_risk_factors(&high_risk_record()),
            vec![
                RiskFactor::Age,
                RiskFactor::Cholesterol,
                RiskFactor::BloodPressure,
                RiskFactor::ChestPain,
                RiskFactor::ExerciseAngina,
                RiskFactor::MajorVessels,
            ]
        );
        assert!(record_risk_factors(&healthy_record()).is_empty());
    }
}
