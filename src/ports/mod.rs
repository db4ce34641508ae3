//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (backend API, session
//! store, randomness).

mod account_api;
mod jitter;
mod prediction_api;
mod session_store;
mod statistics_api;

pub use account_api::{AccountApi, AccountCredentials, AdminUserEntry, ProfileUpdate, PublicUserEntry};
pub use jitter::JitterSource;
pub use prediction_api::{ApiError, PredictionApi, RemotePrediction};
pub use session_store::SessionStore;
pub use statistics_api::{PlatformStats, StatisticsApi};
