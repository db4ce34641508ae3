//! # CardioPredict
//!
//! Client for a cardiovascular risk prediction service.
//!
//! This crate provides:
//! - Validation and encoding of patient data into the model's feature vector
//! - Authenticated calls to the remote prediction service
//! - A local heuristic estimate when the service is unreachable
//! - Account, history and platform statistics operations
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (PatientRecord, FeatureVector, RiskScore, Credential)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (reqwest, SQLite, ChaCha20)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{PatientRecord, PredictionResult, RiskLevel, RiskScore};

/// Result type for CardioPredict operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Error type for operations that cross several layers.
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error(transparent)]
    Unauthenticated(#[from] domain::Unauthenticated),

    #[error("Prediction service error: {0}")]
    Api(#[from] ports::ApiError),

    #[error(transparent)]
    Auth(#[from] application::AuthError),
}
