//! Statistics API port: platform-wide counters published by the backend.

use super::ApiError;
use crate::domain::RiskScore;

/// Prediction counters and the mean risk across all users.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformStats {
    pub total_predictions: u64,
    pub monthly_predictions: u64,
    pub daily_predictions: u64,
    pub average_risk: RiskScore,
}

/// Trait for the public statistics endpoints.
pub trait StatisticsApi: Send + Sync {
    /// # Errors
    /// Returns `ApiError` on transport, status or decoding failure.
    fn total_users(&self) -> Result<u64, ApiError>;

    /// Collect all prediction counters. Fails if any single endpoint fails.
    ///
    /// # Errors
    /// Returns the first `ApiError` encountered.
    fn prediction_stats(&self) -> Result<PlatformStats, ApiError>;
}
