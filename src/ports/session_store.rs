//! Session store port: Trait for the local key/value session state.
//!
//! Holds the credential and a few display flags between invocations.

use crate::domain::SessionContext;

/// Trait for local session persistence.
///
/// The prediction path only ever reads from it; login, logout and profile
/// updates write to it.
pub trait SessionStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the current session; an empty store yields an anonymous session.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read.
    fn load(&self) -> Result<SessionContext, Self::Error>;

    /// Replace the stored session.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn save(&self, session: &SessionContext) -> Result<(), Self::Error>;

    /// Destroy all session state (logout).
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn clear(&self) -> Result<(), Self::Error>;
}
