//! Patient data types for cardiovascular risk prediction.
//!
//! Based on the 13 clinical attributes of the Cleveland heart disease dataset,
//! which is the feature set the prediction backend was trained on.

use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize};

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationReason {
    #[error("value is missing")]
    Missing,

    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("{value} out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("{0} is not an allowed value")]
    NotAllowed(i64),
}

/// A field of the patient record failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid field `{field}`: {reason}")]
pub struct ValidationError {
    /// Wire name of the offending field (see [`crate::domain::FEATURE_NAMES`])
    pub field: &'static str,
    pub reason: ValidationReason,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// Biological sex as encoded by the model (`sex`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub(crate) fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Female),
            1 => Some(Self::Male),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }
}

/// Chest pain type (`cp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestPain {
    TypicalAngina,
    AtypicalAngina,
    NonAnginalPain,
    Asymptomatic,
}

impl ChestPain {
    pub(crate) fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::TypicalAngina),
            1 => Some(Self::AtypicalAngina),
            2 => Some(Self::NonAnginalPain),
            3 => Some(Self::Asymptomatic),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::TypicalAngina => 0,
            Self::AtypicalAngina => 1,
            Self::NonAnginalPain => 2,
            Self::Asymptomatic => 3,
        }
    }
}

/// Resting electrocardiographic result (`restecg`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestingEcg {
    Normal,
    StTAbnormality,
    LeftVentricularHypertrophy,
}

impl RestingEcg {
    pub(crate) fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::StTAbnormality),
            2 => Some(Self::LeftVentricularHypertrophy),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::StTAbnormality => 1,
            Self::LeftVentricularHypertrophy => 2,
        }
    }
}

/// Slope of the peak exercise ST segment (`slope`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StSlope {
    Upsloping,
    Flat,
    Downsloping,
}

impl StSlope {
    pub(crate) fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Upsloping),
            1 => Some(Self::Flat),
            2 => Some(Self::Downsloping),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Upsloping => 0,
            Self::Flat => 1,
            Self::Downsloping => 2,
        }
    }
}

/// Thalassemia type (`thal`). Codes start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Thalassemia {
    Normal,
    FixedDefect,
    ReversibleDefect,
}

impl Thalassemia {
    pub(crate) fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::FixedDefect),
            3 => Some(Self::ReversibleDefect),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Normal => 1,
            Self::FixedDefect => 2,
            Self::ReversibleDefect => 3,
        }
    }
}

// Accepted ranges. The entry form rejects the bounds themselves, so these are
// the inclusive equivalents.
pub const AGE_RANGE: RangeInclusive<i32> = 1..=119;
pub const RESTING_BP_RANGE: RangeInclusive<i32> = 51..=249;
pub const CHOLESTEROL_RANGE: RangeInclusive<i32> = 101..=599;
pub const MAX_HEART_RATE_RANGE: RangeInclusive<i32> = 51..=249;
pub const MAJOR_VESSELS_RANGE: RangeInclusive<i32> = 0..=3;
pub const ST_DEPRESSION_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Validated, typed patient record.
///
/// Numeric fields are stored as entered so that out-of-range values can be
/// reported by [`PatientRecord::validate`] with the offending field name.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    /// Age in years (`age`)
    pub age: i32,
    pub sex: Sex,
    pub chest_pain: ChestPain,
    /// Resting systolic blood pressure in mmHg (`trestbps`)
    pub resting_bp: i32,
    /// Serum cholesterol in mg/dl (`chol`)
    pub cholesterol: i32,
    /// Fasting blood sugar > 120 mg/dl (`fbs`)
    pub fasting_blood_sugar: bool,
    pub resting_ecg: RestingEcg,
    /// Maximum heart rate achieved (`thalach`)
    pub max_heart_rate: i32,
    /// Exercise induced angina (`exang`)
    pub exercise_angina: bool,
    /// ST depression induced by exercise relative to rest (`oldpeak`)
    pub st_depression: f64,
    pub st_slope: StSlope,
    /// Number of major vessels colored by fluoroscopy (`ca`)
    pub major_vessels: i32,
    pub thalassemia: Thalassemia,
}

impl PatientRecord {
    /// Validate that all numeric fields are within their accepted ranges.
    ///
    /// # Errors
    /// Returns every failing field, in feature order.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors = self.range_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn range_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        check_int(&mut errors, "age", self.age, &AGE_RANGE);
        check_int(&mut errors, "trestbps", self.resting_bp, &RESTING_BP_RANGE);
        check_int(&mut errors, "chol", self.cholesterol, &CHOLESTEROL_RANGE);
        check_int(&mut errors, "thalach", self.max_heart_rate, &MAX_HEART_RATE_RANGE);

        if !self.st_depression.is_finite() || !ST_DEPRESSION_RANGE.contains(&self.st_depression) {
            errors.push(ValidationError::new(
                "oldpeak",
                ValidationReason::OutOfRange {
                    value: self.st_depression,
                    min: *ST_DEPRESSION_RANGE.start(),
                    max: *ST_DEPRESSION_RANGE.end(),
                },
            ));
        }

        check_int(&mut errors, "ca", self.major_vessels, &MAJOR_VESSELS_RANGE);
        errors
    }

    /// First failing field, if any.
    pub(crate) fn first_invalid_field(&self) -> Option<ValidationError> {
        self.range_errors().into_iter().next()
    }
}

fn check_int(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: i32,
    range: &RangeInclusive<i32>,
) {
    if !range.contains(&value) {
        errors.push(ValidationError::new(
            field,
            ValidationReason::OutOfRange {
                value: f64::from(value),
                min: f64::from(*range.start()),
                max: f64::from(*range.end()),
            },
        ));
    }
}

/// Patient data as entered: every field is an optional raw string.
///
/// Field names match the wire names used by the prediction backend. When
/// read from JSON, numbers and booleans are accepted and kept as text so
/// that range and type errors are still reported per field by [`parse`].
///
/// [`parse`]: PatientForm::parse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientForm {
    #[serde(default, deserialize_with = "raw_value")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub cp: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub trestbps: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub chol: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub fbs: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub restecg: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub thalach: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub exang: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub oldpeak: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub slope: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub ca: Option<String>,
    #[serde(default, deserialize_with = "raw_value")]
    pub thal: Option<String>,
}

impl PatientForm {
    /// Convert the raw strings into a typed record.
    ///
    /// Range checks are deferred to [`PatientRecord::validate`]; this step only
    /// rejects missing values, non-numeric input and codes outside an
    /// enumeration.
    ///
    /// # Errors
    /// Returns the first field that cannot be converted.
    pub fn parse(&self) -> Result<PatientRecord, ValidationError> {
        Ok(PatientRecord {
            age: parse_int("age", &self.age)?,
            sex: parse_code("sex", &self.sex, Sex::from_code)?,
            chest_pain: parse_code("cp", &self.cp, ChestPain::from_code)?,
            resting_bp: parse_int("trestbps", &self.trestbps)?,
            cholesterol: parse_int("chol", &self.chol)?,
            fasting_blood_sugar: parse_code("fbs", &self.fbs, flag_from_code)?,
            resting_ecg: parse_code("restecg", &self.restecg, RestingEcg::from_code)?,
            max_heart_rate: parse_int("thalach", &self.thalach)?,
            exercise_angina: parse_code("exang", &self.exang, flag_from_code)?,
            st_depression: parse_float("oldpeak", &self.oldpeak)?,
            st_slope: parse_code("slope", &self.slope, StSlope::from_code)?,
            major_vessels: parse_int("ca", &self.ca)?,
            thalassemia: parse_code("thal", &self.thal, Thalassemia::from_code)?,
        })
    }
}

/// Accept a JSON string, number or boolean and keep its textual form.
fn raw_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
        Raw::Flag(flag) => u8::from(flag).to_string(),
    }))
}

pub(crate) fn flag_from_code(code: i64) -> Option<bool> {
    match code {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::new(field, ValidationReason::Missing)),
    }
}

fn parse_int(field: &'static str, value: &Option<String>) -> Result<i32, ValidationError> {
    let raw = required(field, value)?;
    raw.parse::<i32>()
        .map_err(|_| ValidationError::new(field, ValidationReason::NotANumber(raw.to_string())))
}

fn parse_float(field: &'static str, value: &Option<String>) -> Result<f64, ValidationError> {
    let raw = required(field, value)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::new(
            field,
            ValidationReason::NotANumber(raw.to_string()),
        )),
    }
}

fn parse_code<T>(
    field: &'static str,
    value: &Option<String>,
    from_code: fn(i64) -> Option<T>,
) -> Result<T, ValidationError> {
    let raw = required(field, value)?;
    let code = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::new(field, ValidationReason::NotANumber(raw.to_string())))?;
    from_code(code).ok_or_else(|| ValidationError::new(field, ValidationReason::NotAllowed(code)))
}
