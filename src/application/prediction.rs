//! Prediction service: Orchestrates the risk prediction pipeline.
//!
//! This service coordinates:
//! - The credential gate
//! - Feature encoding
//! - A single call to the remote model
//! - The local heuristic when that call fails

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    estimate_risk, record_risk_factors, FeatureVector, HistoryEntry, PatientForm, PatientRecord,
    PredictionResult, PredictionSource, RiskScore, SessionContext, Unauthenticated,
    ValidationError,
};
use crate::ports::{JitterSource, PredictionApi};

/// Errors that abort a prediction before any network I/O.
///
/// Service failures are not represented: they are absorbed by the fallback.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Unauthenticated(#[from] Unauthenticated),
}

/// Service for obtaining risk predictions.
pub struct PredictionService<A, J>
where
    A: PredictionApi,
    J: JitterSource,
{
    api: Arc<A>,
    jitter: Arc<J>,
}

impl<A, J> PredictionService<A, J>
where
    A: PredictionApi,
    J: JitterSource,
{
    /// Create a new prediction service.
    pub fn new(api: Arc<A>, jitter: Arc<J>) -> Self {
        Self { api, jitter }
    }

    /// Score a patient record.
    ///
    /// The remote service is tried exactly once. Any transport, status or
    /// decoding failure is logged and replaced by the local estimate; the
    /// result's `source` tells the two apart.
    ///
    /// # Errors
    /// `Unauthenticated` if the session holds no credential, `Validation` if
    /// the record fails a range check. Neither issues a network call.
    pub fn predict(
        &self,
        session: &SessionContext,
        record: &PatientRecord,
    ) -> Result<PredictionResult, PredictionError> {
        let credential = session.require_credential()?;
        let vector = FeatureVector::encode(record)?;

        tracing::debug!(
            "Requesting prediction with credential {}",
            credential.fingerprint()
        );

        match self.api.predict(credential, &vector) {
            Ok(remote) => {
                let risk_factors = remote
                    .risk_factors
                    .unwrap_or_else(|| record_risk_factors(record));
                let result = PredictionResult {
                    risk_score: remote.risk_score,
                    risk_factors,
                    timestamp: remote.timestamp.unwrap_or_else(Utc::now),
                    source: PredictionSource::Remote,
                };
                tracing::info!(
                    "Prediction received: {} ({})",
                    result.risk_score,
                    result.risk_level()
                );
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Prediction service unavailable ({e}); using local estimate");
                Ok(self.fallback(&vector))
            }
        }
    }

    /// Parse raw form input, then score it.
    ///
    /// The credential is checked before the form so an anonymous caller is
    /// told to log in rather than to fix a field.
    ///
    /// # Errors
    /// Same as [`Self::predict`]; parse failures surface as `Validation`.
    pub fn predict_form(
        &self,
        session: &SessionContext,
        form: &PatientForm,
    ) -> Result<PredictionResult, PredictionError> {
        session.require_credential()?;
        let record = form.parse()?;
        self.predict(session, &record)
    }

    /// Fetch the caller's past predictions.
    ///
    /// # Errors
    /// Returns `Unauthenticated` without a credential, or the `ApiError`
    /// from the backend. No substitute data is produced.
    pub fn history(&self, session: &SessionContext) -> crate::Result<Vec<HistoryEntry>> {
        let credential = session.require_credential()?;
        let entries = self.api.history(credential)?;
        tracing::info!("Loaded {} history entries", entries.len());
        Ok(entries)
    }

    fn fallback(&self, vector: &FeatureVector) -> PredictionResult {
        let estimate = estimate_risk(vector, self.jitter.sample());
        let result = PredictionResult {
            risk_score: RiskScore::from_percent(estimate.score),
            risk_factors: estimate.factors,
            timestamp: Utc::now(),
            source: PredictionSource::Fallback,
        };
        tracing::info!(
            "Local estimate: {} ({})",
            result.risk_score,
            result.risk_level()
        );
        result
    }
}
