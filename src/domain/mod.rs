//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! Patient input is validated here before anything leaves the process.

mod faq;
mod features;
pub mod heuristic;
mod patient;
mod prediction;
mod session;

pub use faq::{answer, FaqEntry, DEFAULT_ANSWER, KNOWLEDGE_BASE};
pub use features::{Feature, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use heuristic::{estimate_risk, record_risk_factors, RiskEstimate};
pub use patient::{
    ChestPain, PatientForm, PatientRecord, RestingEcg, Sex, StSlope, Thalassemia,
    ValidationError, ValidationReason,
};
pub use prediction::{
    parse_timestamp, HistoryEntry, PredictionResult, PredictionSource, RiskFactor, RiskLevel,
    RiskScore,
};
pub use session::{Credential, Role, SessionContext, Unauthenticated};
