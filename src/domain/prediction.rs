//! Prediction result types.
//!
//! Represents the output of the cardiovascular risk prediction, whether it
//! came from the remote model or from the local fallback estimator.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk score normalized to the closed interval [0, 1].
///
/// Wire values (remote predictions, history entries, average risk) are
/// percentages; use [`RiskScore::from_percent`] for those.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(f64);

impl RiskScore {
    /// Build from a 0..1 fraction, clamping. Non-finite input maps to 0.
    #[must_use]
    pub fn from_fraction(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    /// Build from a 0..100 percentage, clamping.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        Self::from_fraction(percent / 100.0)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn as_percent(self) -> f64 {
        self.0 * 100.0
    }

    #[must_use]
    pub fn risk_level(self) -> RiskLevel {
        RiskLevel::from_score(self)
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.as_percent())
    }
}

/// Risk level classification for heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of heart disease
    Low,
    /// Moderate risk, monitoring recommended
    Moderate,
    /// High risk, intervention recommended
    High,
}

impl RiskLevel {
    /// Classify a normalized score: below 0.3 is low, below 0.7 moderate.
    #[must_use]
    pub fn from_score(score: RiskScore) -> Self {
        if score.value() < 0.3 {
            Self::Low
        } else if score.value() < 0.7 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Immediate consultation advised",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A human-readable contributor to the risk score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskFactor {
    Age,
    ChestPain,
    BloodPressure,
    Cholesterol,
    FastingBloodSugar,
    MaxHeartRate,
    ExerciseAngina,
    MajorVessels,
    Thalassemia,
    /// Label supplied by the backend that has no local equivalent
    Other(String),
}

impl RiskFactor {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Age => "Age",
            Self::ChestPain => "Chest pain (typical angina)",
            Self::BloodPressure => "Blood pressure",
            Self::Cholesterol => "Cholesterol",
            Self::FastingBloodSugar => "Fasting blood sugar",
            Self::MaxHeartRate => "Low maximum heart rate",
            Self::ExerciseAngina => "Exercise-induced angina",
            Self::MajorVessels => "Major vessels",
            Self::Thalassemia => "Thalassemia (reversible defect)",
            Self::Other(label) => label,
        }
    }

    /// Translate a label from the backend.
    ///
    /// Accepts the local English labels and the backend's French labels,
    /// case-insensitively. Anything else is kept verbatim as `Other`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let key = label.trim().to_lowercase();
        match key.as_str() {
            "age" | "âge" => Self::Age,
            "chest pain" | "chest pain (typical angina)" | "douleur thoracique"
            | "douleur thoracique (angine typique)" => Self::ChestPain,
            "blood pressure" | "tension artérielle" => Self::BloodPressure,
            "cholesterol" | "cholestérol" => Self::Cholesterol,
            "fasting blood sugar" | "glycémie à jeun" => Self::FastingBloodSugar,
            "low maximum heart rate" | "max heart rate" | "fréquence cardiaque maximale" => {
                Self::MaxHeartRate
            }
            "exercise-induced angina" | "exercise angina" | "angine induite par l'exercice" => {
                Self::ExerciseAngina
            }
            "major vessels" | "vaisseaux majeurs" => Self::MajorVessels,
            "thalassemia" | "thalassemia (reversible defect)" | "thalassémie" => Self::Thalassemia,
            _ => Self::Other(label.trim().to_string()),
        }
    }
}

impl From<String> for RiskFactor {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<RiskFactor> for String {
    fn from(factor: RiskFactor) -> Self {
        factor.label().to_string()
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which path produced a [`PredictionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// The remote prediction service answered
    Remote,
    /// The service was unreachable; the local estimator was used
    Fallback,
}

/// Outcome of a prediction, identical in shape for both sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_score: RiskScore,
    pub risk_factors: Vec<RiskFactor>,
    pub timestamp: DateTime<Utc>,
    pub source: PredictionSource,
}

impl PredictionResult {
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_score.risk_level()
    }

    /// Binary flag reported alongside the score: strictly above 50%.
    #[must_use]
    pub fn at_risk(&self) -> bool {
        self.risk_score.value() > 0.5
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == PredictionSource::Fallback
    }
}

/// A past prediction as returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Inputs as recorded by the backend (free-form)
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub risk_score: RiskScore,
    pub risk_factors: Vec<RiskFactor>,
}

/// Parse a backend timestamp.
///
/// The backend emits RFC 3339 or naive ISO 8601 timestamps; naive values are
/// taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_risk_level_from_score() {
        assert_eq!(RiskScore::from_fraction(0.1).risk_level(), RiskLevel::Low);
        assert_eq!(RiskScore::from_fraction(0.3).risk_level(), RiskLevel::Moderate);
        assert_eq!(RiskScore::from_fraction(0.5).risk_level(), RiskLevel::Moderate);
        assert_eq!(RiskScore::from_fraction(0.7).risk_level(), RiskLevel::High);
        assert_eq!(RiskScore::from_fraction(0.9).risk_level(), RiskLevel::High);
    }

    #[test]
    fn test_percent_normalization() {
        assert!((RiskScore::from_percent(42.0).value() - 0.42).abs() < 1e-12);
        assert_eq!(RiskScore::from_percent(150.0).value(), 1.0);
        assert_eq!(RiskScore::from_percent(-3.0).value(), 0.0);
        assert_eq!(RiskScore::from_fraction(f64::NAN).value(), 0.0);
        assert_eq!(RiskScore::from_percent(99.0).to_string(), "99.0%");
    }

    #[test]
    fn test_factor_translation() {
        assert_eq!(RiskFactor::from_label("Âge"), RiskFactor::Age);
        assert_eq!(RiskFactor::from_label("Tension artérielle"), RiskFactor::BloodPressure);
        assert_eq!(
            RiskFactor::from_label("Douleur thoracique (Angine typique)"),
            RiskFactor::ChestPain
        );
        assert_eq!(RiskFactor::from_label("cholesterol"), RiskFactor::Cholesterol);
        assert_eq!(
            RiskFactor::from_label(" Smoking "),
            RiskFactor::Other("Smoking".to_string())
        );
    }

    #[test]
    fn test_factor_serde_uses_labels() {
        let json = serde_json::to_string(&vec![RiskFactor::Age, RiskFactor::MajorVessels])
            .expect("Should serialize");
        assert_eq!(json, r#"["Age","Major vessels"]"#);

        let back: Vec<RiskFactor> =
            serde_json::from_str(r#"["Cholestérol","Vaisseaux majeurs"]"#).expect("Should parse");
        assert_eq!(back, vec![RiskFactor::Cholesterol, RiskFactor::MajorVessels]);
    }

    #[test]
    fn test_at_risk_threshold() {
        let mut result = PredictionResult {
            risk_score: RiskScore::from_percent(50.0),
            risk_factors: Vec::new(),
            timestamp: Utc::now(),
            source: PredictionSource::Remote,
        };
        assert!(!result.at_risk());
        result.risk_score = RiskScore::from_percent(51.0);
        assert!(result.at_risk());
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-05T10:20:30Z").expect("RFC 3339");
        assert_eq!(rfc.hour(), 10);

        let naive = parse_timestamp("2024-03-05T10:20:30.123456").expect("Naive ISO");
        assert_eq!(naive.month(), 3);

        let spaced = parse_timestamp("2024-03-05 10:20:30").expect("Space separated");
        assert_eq!(spaced.day(), 5);

        assert!(parse_timestamp("yesterday").is_none());
    }
}
