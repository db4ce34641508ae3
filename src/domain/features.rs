//! Feature vector sent to the prediction backend.

use serde::Serialize;

use super::patient::{
    flag_from_code, ChestPain, PatientRecord, RestingEcg, Sex, StSlope, Thalassemia,
    ValidationError, ValidationReason,
};

/// Number of features expected by the backend model.
pub const FEATURE_COUNT: usize = 13;

/// Wire names, in the order the backend expects.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Position of each feature in a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Age = 0,
    Sex,
    ChestPain,
    RestingBp,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    StDepression,
    StSlope,
    MajorVessels,
    Thalassemia,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Self::Age,
        Self::Sex,
        Self::ChestPain,
        Self::RestingBp,
        Self::Cholesterol,
        Self::FastingBloodSugar,
        Self::RestingEcg,
        Self::MaxHeartRate,
        Self::ExerciseAngina,
        Self::StDepression,
        Self::StSlope,
        Self::MajorVessels,
        Self::Thalassemia,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }
}

/// Ordered, immutable numeric encoding of a validated [`PatientRecord`].
///
/// Serializes as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Encode a record in backend order.
    ///
    /// # Errors
    /// Returns the first field that fails its range check.
    pub fn encode(record: &PatientRecord) -> Result<Self, ValidationError> {
        if let Some(err) = record.first_invalid_field() {
            return Err(err);
        }

        Ok(Self([
            f64::from(record.age),
            record.sex.code() as f64,
            record.chest_pain.code() as f64,
            f64::from(record.resting_bp),
            f64::from(record.cholesterol),
            flag(record.fasting_blood_sugar),
            record.resting_ecg.code() as f64,
            f64::from(record.max_heart_rate),
            flag(record.exercise_angina),
            record.st_depression,
            record.st_slope.code() as f64,
            f64::from(record.major_vessels),
            record.thalassemia.code() as f64,
        ]))
    }

    /// Decode back into a record, re-validating every field.
    ///
    /// # Errors
    /// Returns an error naming the field that is not an integer where one is
    /// required, is outside its enumeration, or is out of range.
    pub fn decode(&self) -> Result<PatientRecord, ValidationError> {
        let record = PatientRecord {
            age: self.int(Feature::Age)?,
            sex: self.code(Feature::Sex, Sex::from_code)?,
            chest_pain: self.code(Feature::ChestPain, ChestPain::from_code)?,
            resting_bp: self.int(Feature::RestingBp)?,
            cholesterol: self.int(Feature::Cholesterol)?,
            fasting_blood_sugar: self.code(Feature::FastingBloodSugar, flag_from_code)?,
            resting_ecg: self.code(Feature::RestingEcg, RestingEcg::from_code)?,
            max_heart_rate: self.int(Feature::MaxHeartRate)?,
            exercise_angina: self.code(Feature::ExerciseAngina, flag_from_code)?,
            st_depression: self.get(Feature::StDepression),
            st_slope: self.code(Feature::StSlope, StSlope::from_code)?,
            major_vessels: self.int(Feature::MajorVessels)?,
            thalassemia: self.code(Feature::Thalassemia, Thalassemia::from_code)?,
        };

        match record.first_invalid_field() {
            Some(err) => Err(err),
            None => Ok(record),
        }
    }

    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a 0/1 flag feature is set.
    #[must_use]
    pub fn is_set(&self, feature: Feature) -> bool {
        self.get(feature) == 1.0
    }

    fn int(&self, feature: Feature) -> Result<i32, ValidationError> {
        let v = self.get(feature);
        if !v.is_finite() || v.fract() != 0.0 || v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
            return Err(ValidationError::new(
                feature.name(),
                ValidationReason::NotANumber(v.to_string()),
            ));
        }
        Ok(v as i32)
    }

    fn code<T>(&self, feature: Feature, from_code: fn(i64) -> Option<T>) -> Result<T, ValidationError> {
        let code = i64::from(self.int(feature)?);
        from_code(code)
            .ok_or_else(|| ValidationError::new(feature.name(), ValidationReason::NotAllowed(code)))
    }
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}
