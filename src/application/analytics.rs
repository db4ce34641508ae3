//! Analytics service: Summaries over prediction history and platform counters.
//!
//! History summaries are computed locally from entries the caller already
//! fetched. Platform figures come straight from the backend; a failing
//! endpoint is reported, never papered over.

use std::sync::Arc;

use chrono::Datelike;

use super::AuthError;
use crate::domain::{HistoryEntry, RiskLevel, RiskScore, SessionContext};
use crate::ports::{AccountApi, AdminUserEntry, PlatformStats, PublicUserEntry, StatisticsApi};

/// Number of predictions made in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCount {
    /// `M/YYYY`, month not zero-padded
    pub month: String,
    pub count: usize,
}

/// Entries per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskDistribution {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
}

impl RiskDistribution {
    fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Moderate => self.moderate += 1,
            RiskLevel::High => self.high += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.low + self.moderate + self.high
    }
}

/// Aggregate view of a user's history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    /// In order of first appearance in the history
    pub monthly: Vec<MonthlyCount>,
    pub distribution: RiskDistribution,
    pub average_risk: Option<RiskScore>,
}

impl HistorySummary {
    /// Summarize entries in the order the backend returned them.
    #[must_use]
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut monthly: Vec<MonthlyCount> = Vec::new();
        let mut distribution = RiskDistribution::default();
        let mut sum = 0.0;

        for entry in entries {
            let key = format!("{}/{}", entry.timestamp.month(), entry.timestamp.year());
            match monthly.iter_mut().find(|m| m.month == key) {
                Some(m) => m.count += 1,
                None => monthly.push(MonthlyCount {
                    month: key,
                    count: 1,
                }),
            }

            distribution.record(entry.risk_score.risk_level());
            sum += entry.risk_score.value();
        }

        #[allow(clippy::cast_precision_loss)]
        let average_risk =
            (!entries.is_empty()).then(|| RiskScore::from_fraction(sum / entries.len() as f64));

        Self {
            total: entries.len(),
            monthly,
            distribution,
            average_risk,
        }
    }
}

/// Backend-wide figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformOverview {
    pub total_users: u64,
    pub predictions: PlatformStats,
}

/// Service for dashboards and user listings.
pub struct AnalyticsService<S, A>
where
    S: StatisticsApi,
    A: AccountApi,
{
    stats: Arc<S>,
    accounts: Arc<A>,
}

impl<S, A> AnalyticsService<S, A>
where
    S: StatisticsApi,
    A: AccountApi,
{
    /// Create a new analytics service.
    pub fn new(stats: Arc<S>, accounts: Arc<A>) -> Self {
        Self { stats, accounts }
    }

    /// Summarize a user's history.
    #[must_use]
    pub fn summarize_history(&self, entries: &[HistoryEntry]) -> HistorySummary {
        let summary = HistorySummary::from_entries(entries);
        tracing::debug!(
            "History summary: {} entries over {} months",
            summary.total,
            summary.monthly.len()
        );
        summary
    }

    /// Fetch the platform counters.
    ///
    /// # Errors
    /// Returns the first `ApiError` from any statistics endpoint.
    pub fn platform_overview(&self) -> crate::Result<PlatformOverview> {
        let total_users = self.stats.total_users()?;
        let predictions = self.stats.prediction_stats()?;
        tracing::info!(
            "Platform: {} users, {} predictions",
            total_users,
            predictions.total_predictions
        );
        Ok(PlatformOverview {
            total_users,
            predictions,
        })
    }

    /// Full user listing, for logged-in admins only.
    ///
    /// The session is checked before any request is made.
    ///
    /// # Errors
    /// `Unauthenticated` without a credential, `Auth(Forbidden)` for a
    /// non-admin session, otherwise the `ApiError` (403 on a bad admin key).
    pub fn admin_users(
        &self,
        session: &SessionContext,
        admin_key: &str,
    ) -> crate::Result<Vec<AdminUserEntry>> {
        session.require_credential()?;
        if !session.is_admin() {
            tracing::warn!("Admin listing refused for role {}", session.role);
            return Err(AuthError::Forbidden.into());
        }
        Ok(self.accounts.admin_users(admin_key)?)
    }

    /// Public user listing.
    ///
    /// # Errors
    /// Returns `ApiError` on failure.
    pub fn public_users(&self) -> crate::Result<Vec<PublicUserEntry>> {
        Ok(self.accounts.public_users()?)
    }
}
