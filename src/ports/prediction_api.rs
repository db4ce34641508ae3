//! Prediction API port: Trait for the remote prediction service.
//!
//! This trait abstracts the HTTP transport from the application logic.

use chrono::{DateTime, Utc};

use crate::domain::{Credential, FeatureVector, HistoryEntry, RiskFactor, RiskScore};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    Request(String),
}

impl ApiError {
    /// HTTP status, if the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A well-formed answer from the prediction endpoint.
#[derive(Debug, Clone)]
pub struct RemotePrediction {
    /// Normalized score (the wire value is a percentage)
    pub risk_score: RiskScore,

    /// Factors reported by the service, when it reports any
    pub risk_factors: Option<Vec<RiskFactor>>,

    /// Service-side timestamp, when present
    pub timestamp: Option<DateTime<Utc>>,
}

/// Trait for the remote prediction service.
///
/// Implementations make exactly one request per call and never retry.
pub trait PredictionApi: Send + Sync {
    /// Submit a feature vector for scoring.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure, non-success status, or an
    /// unparseable body.
    fn predict(
        &self,
        credential: &Credential,
        features: &FeatureVector,
    ) -> Result<RemotePrediction, ApiError>;

    /// Fetch the caller's past predictions, oldest first as stored.
    ///
    /// # Errors
    /// Returns `ApiError` on transport failure, non-success status, or an
    /// unparseable body.
    fn history(&self, credential: &Credential) -> Result<Vec<HistoryEntry>, ApiError>;
}
