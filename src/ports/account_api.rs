//! Account API port: registration, login, profile updates and user listings.

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::domain::{Credential, Role};

/// Username/password pair sent to `/register` and `/login`.
#[derive(Clone, Serialize)]
pub struct AccountCredentials {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
    pub role: Role,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            password: password.into(),
            role: Role::User,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Requested profile changes; `None` leaves the field untouched.
#[derive(Clone, Default)]
pub struct ProfileUpdate {
    pub new_username: Option<String>,
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_username.is_none() && self.new_password.is_none()
    }
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("new_username", &self.new_username)
            .field("new_password", &self.new_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUserEntry {
    pub id: i64,
    pub username: String,
    pub predictions_count: u64,
    pub last_activity: String,
}

/// Row of the public user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUserEntry {
    pub username: String,
    pub account_age_days: u64,
}

/// Trait for account operations against the backend.
pub trait AccountApi: Send + Sync {
    /// Create an account; the backend answers with a fresh credential.
    ///
    /// # Errors
    /// `ApiError::Status` with 409 when the username is taken, 400 on bad input.
    fn register(&self, account: &AccountCredentials) -> Result<Credential, ApiError>;

    /// # Errors
    /// `ApiError::Status` with 401 on wrong username or password.
    fn login(&self, account: &AccountCredentials) -> Result<Credential, ApiError>;

    /// Apply a profile change.
    ///
    /// Returns a rotated credential when the backend issues one (it does so
    /// on username changes).
    ///
    /// # Errors
    /// `ApiError::Status` with 403 when the credential does not own `username`.
    fn update_user(
        &self,
        username: &str,
        credential: &Credential,
        update: &ProfileUpdate,
    ) -> Result<Option<Credential>, ApiError>;

    /// Full user listing; requires the admin key.
    ///
    /// # Errors
    /// `ApiError::Status` with 403 on a bad admin key.
    fn admin_users(&self, admin_key: &str) -> Result<Vec<AdminUserEntry>, ApiError>;

    /// # Errors
    /// Returns `ApiError` on transport or decoding failure.
    fn public_users(&self) -> Result<Vec<PublicUserEntry>, ApiError>;
}
