//! Session types: the API credential and the per-user session context.
//!
//! # Memory Security
//!
//! `Credential` implements `Zeroize` and `ZeroizeOnDrop`, and its `Debug`
//! output only shows a fingerprint.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// No credential is present in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Not authenticated: log in to obtain an API key")]
pub struct Unauthenticated;

/// Opaque API key issued by the backend at login or registration.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    token: String,

    /// Fingerprint for log correlation (NOT secret)
    #[zeroize(skip)]
    fingerprint: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let fingerprint = compute_fingerprint(token.as_bytes());
        Self { token, fingerprint }
    }

    /// The raw token, for placing on the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.token.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Role shown to the user; gates the admin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Unknown roles fall back to `User`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit session state handed to services instead of ambient lookups.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub credential: Option<Credential>,
    pub username: Option<String>,
    pub role: Role,
    /// Set when the user chose to continue without reaching the backend
    pub offline: bool,
}

impl SessionContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(credential: Credential, username: impl Into<String>, role: Role) -> Self {
        Self {
            credential: Some(credential),
            username: Some(username.into()),
            role,
            offline: false,
        }
    }

    /// Whether a non-blank credential is present.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_blank())
    }

    /// # Errors
    /// Returns `Unauthenticated` when no usable credential is present.
    pub fn require_credential(&self) -> Result<&Credential, Unauthenticated> {
        self.credential
            .as_ref()
            .filter(|c| !c.is_blank())
            .ok_or(Unauthenticated)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Compute a fingerprint for credential identification using SHA-256.
fn compute_fingerprint(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();

    // First 8 bytes (64 bits) of the hash
    result[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_no_leak() {
        let credential = Credential::new("sk-live-0123456789");
        let debug_output = format!("{credential:?}");

        assert!(!debug_output.contains("sk-live"));
        assert!(debug_output.contains("fingerprint"));
        assert_eq!(credential.expose(), "sk-live-0123456789");
    }

    #[test]
    fn test_fingerprint_is_hashed() {
        let fp = compute_fingerprint(b"deadbeef");
        assert_ne!(fp, "deadbeef");
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, compute_fingerprint(b"deadbeef"));
    }

    #[test]
    fn test_require_credential() {
        let anonymous = SessionContext::anonymous();
        assert!(!anonymous.has_credential());
        assert_eq!(anonymous.require_credential().expect_err("No key"), Unauthenticated);

        let session = SessionContext::authenticated(Credential::new("abc"), "alice", Role::User);
        assert!(session.has_credential());
        assert_eq!(session.require_credential().expect("Key present").expose(), "abc");
    }

    #[test]
    fn test_blank_credential_is_not_a_credential() {
        let session = SessionContext {
            credential: Some(Credential::new("  ")),
            ..SessionContext::default()
        };
        assert!(!session.has_credential());
        assert!(session.require_credential().is_err());
    }

    #[test]
    fn test_offline_session_has_no_credential() {
        let session = SessionContext {
            username: Some("guest".into()),
            offline: true,
            ..SessionContext::default()
        };
        assert!(!session.has_credential());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("superuser"), Role::User);
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
