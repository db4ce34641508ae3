//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod analytics;
mod auth;
mod prediction;

pub use analytics::{
    AnalyticsService, HistorySummary, MonthlyCount, PlatformOverview, RiskDistribution,
};
pub use auth::{AuthError, AuthService};
pub use prediction::{PredictionError, PredictionService};
