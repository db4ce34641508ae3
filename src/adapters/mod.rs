//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `http`: reqwest client for the prediction backend
//! - `sqlite`: SQLite for the local session
//! - `jitter`: ChaCha20 noise for fallback estimates
//! - `sanitize`: secret filtering for logs

pub mod http;
pub mod jitter;
pub mod sanitize;
pub mod sqlite;

pub use http::{ApiEndpoints, HttpApiClient};
pub use jitter::{FixedJitter, SeededJitter};
pub use sqlite::{SqliteSessionStore, StoreError};
