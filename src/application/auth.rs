//! Auth service: Account lifecycle and the local session.
//!
//! The session store is the only place a credential lives between
//! invocations. Login and registration write it, logout destroys it.

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::domain::{Credential, Role, SessionContext, Unauthenticated};
use crate::ports::{AccountApi, AccountCredentials, ApiError, ProfileUpdate, SessionStore};

const MIN_USERNAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid account data: {0}")]
    Validation(String),

    #[error("Username already exists")]
    Conflict,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Access denied")]
    Forbidden,

    #[error(transparent)]
    Unauthenticated(#[from] Unauthenticated),

    #[error("Account service error: {0}")]
    Api(ApiError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ApiError> for AuthError {
    fn from(e: ApiError) -> Self {
        match e.status() {
            Some(400) => Self::Validation("the service rejected the data format".to_string()),
            Some(401) => Self::InvalidCredentials,
            Some(403) => Self::Forbidden,
            Some(409) => Self::Conflict,
            _ => Self::Api(e),
        }
    }
}

/// Service for registration, login and profile management.
pub struct AuthService<A, S>
where
    A: AccountApi,
    S: SessionStore,
{
    api: Arc<A>,
    store: Arc<S>,
}

impl<A, S> AuthService<A, S>
where
    A: AccountApi,
    S: SessionStore,
    S::Error: Into<StoreError>,
{
    /// Create a new auth service.
    pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
        Self { api, store }
    }

    /// Create an account and start a session for it.
    ///
    /// # Errors
    /// `Validation` for a short username or password (checked before any
    /// request), `Conflict` if the name is taken, `Store` if the session
    /// cannot be written.
    pub fn register(&self, account: &AccountCredentials) -> Result<SessionContext, AuthError> {
        validate_account(account)?;

        let credential = self.api.register(account)?;
        tracing::info!("Registered account {}", account.username);
        self.start_session(credential, &account.username, account.role)
    }

    /// Log in and start a session.
    ///
    /// # Errors
    /// `InvalidCredentials` on a 401, `Store` if the session cannot be written.
    pub fn login(&self, account: &AccountCredentials) -> Result<SessionContext, AuthError> {
        if account.username.trim().is_empty() || account.password.is_empty() {
            return Err(AuthError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let credential = self.api.login(account)?;
        tracing::info!("Logged in as {}", account.username);
        self.start_session(credential, &account.username, account.role)
    }

    /// Destroy the credential and every session flag.
    ///
    /// # Errors
    /// Returns `Store` if the store cannot be cleared.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear().map_err(|e| AuthError::Store(e.into()))?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Continue without the backend.
    ///
    /// Any previous credential is dropped; predictions stay unavailable
    /// until the next login.
    ///
    /// # Errors
    /// `Validation` for a blank username, `Store` on write failure.
    pub fn enter_offline_mode(&self, username: &str) -> Result<SessionContext, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("username is required".to_string()));
        }

        let session = SessionContext {
            credential: None,
            username: Some(username.to_string()),
            role: Role::User,
            offline: true,
        };
        self.save(&session)?;
        tracing::warn!("Offline mode enabled for {username}");
        Ok(session)
    }

    /// Change the username and/or password of the logged-in account.
    ///
    /// A rotated credential returned by the backend replaces the stored one.
    ///
    /// # Errors
    /// `Validation` for an empty update or short values, `Unauthenticated`
    /// without a stored credential (offline sessions included), `Api`-derived
    /// variants for backend failures (`Forbidden` on 403).
    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<SessionContext, AuthError> {
        if update.is_empty() {
            return Err(AuthError::Validation("nothing to update".to_string()));
        }
        if let Some(name) = &update.new_username {
            check_len("username", name.trim(), MIN_USERNAME_LEN)?;
        }
        if let Some(password) = &update.new_password {
            check_len("password", password, MIN_PASSWORD_LEN)?;
        }

        let mut session = self.current_session()?;
        let credential = session.require_credential()?;
        let username = session
            .username
            .clone()
            .ok_or_else(|| AuthError::Validation("no username in session".to_string()))?;

        let rotated = self.api.update_user(&username, credential, update)?;

        if let Some(new_name) = &update.new_username {
            session.username = Some(new_name.trim().to_string());
        }
        if let Some(credential) = rotated {
            tracing::info!("Credential rotated to {}", credential.fingerprint());
            session.credential = Some(credential);
        }
        self.save(&session)?;
        tracing::info!("Profile updated for {username}");
        Ok(session)
    }

    /// The stored session, or an anonymous one.
    ///
    /// # Errors
    /// Returns `Store` if the store cannot be read.
    pub fn current_session(&self) -> Result<SessionContext, AuthError> {
        self.store.load().map_err(|e| AuthError::Store(e.into()))
    }

    fn start_session(
        &self,
        credential: Credential,
        username: &str,
        role: Role,
    ) -> Result<SessionContext, AuthError> {
        let session = SessionContext::authenticated(credential, username.trim(), role);
        self.save(&session)?;
        Ok(session)
    }

    fn save(&self, session: &SessionContext) -> Result<(), AuthError> {
        self.store
            .save(session)
            .map_err(|e| AuthError::Store(e.into()))
    }
}

fn validate_account(account: &AccountCredentials) -> Result<(), AuthError> {
    check_len("username", account.username.trim(), MIN_USERNAME_LEN)?;
    check_len("password", &account.password, MIN_PASSWORD_LEN)
}

fn check_len(what: &str, value: &str, min: usize) -> Result<(), AuthError> {
    if value.chars().count() < min {
        return Err(AuthError::Validation(format!(
            "{what} must contain at least {min} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteSessionStore;
    use crate::ports::{AdminUserEntry, PublicUserEntry};
    use std::sync::Mutex;

    /// Account backend with a fixed set of users and canned failures.
    #[derive(Default)]
    struct MockAccounts {
        users: Mutex<Vec<(String, String)>>,
        rotate_on_rename: bool,
        update_status: Option<u16>,
        requests: Mutex<usize>,
    }

    impl MockAccounts {
        fn with_user(name: &str, password: &str) -> Self {
            let mock = Self::default();
            mock.users
                .lock()
                .expect("Mock lock")
                .push((name.to_string(), password.to_string()));
            mock
        }

        fn count(&self) {
            *self.requests.lock().expect("Mock lock") += 1;
        }

        fn requests(&self) -> usize {
            *self.requests.lock().expect("Mock lock")
        }
    }

    fn status(status: u16) -> ApiError {
        ApiError::Status {
            status,
            message: String::new(),
        }
    }

    impl AccountApi for MockAccounts {
        fn register(&self, account: &AccountCredentials) -> Result<Credential, ApiError> {
            self.count();
            let mut users = self.users.lock().expect("Mock lock");
            if users.iter().any(|(u, _)| *u == account.username) {
                return Err(status(409));
            }
            users.push((account.username.clone(), account.password.clone()));
            Ok(Credential::new(format!("key-{}", account.username)))
        }

        fn login(&self, account: &AccountCredentials) -> Result<Credential, ApiError> {
            self.count();
            let users = self.users.lock().expect("Mock lock");
            if users
                .iter()
                .any(|(u, p)| *u == account.username && *p == account.password)
            {
                Ok(Credential::new(format!("key-{}", account.username)))
            } else {
                Err(status(401))
            }
        }

        fn update_user(
            &self,
            _username: &str,
            _credential: &Credential,
            update: &ProfileUpdate,
        ) -> Result<Option<Credential>, ApiError> {
            self.count();
            if let Some(code) = self.update_status {
                return Err(status(code));
            }
            Ok(match (&update.new_username, self.rotate_on_rename) {
                (Some(name), true) => Some(Credential::new(format!("key-{name}"))),
                _ => None,
            })
        }

        fn admin_users(&self, _admin_key: &str) -> Result<Vec<AdminUserEntry>, ApiError> {
            Ok(Vec::new())
        }

        fn public_users(&self) -> Result<Vec<PublicUserEntry>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn service(api: MockAccounts) -> AuthService<MockAccounts, SqliteSessionStore> {
        let store = SqliteSessionStore::in_memory().expect("Should create db");
        AuthService::new(Arc::new(api), Arc::new(store))
    }

    #[test]
    fn test_register_starts_session() {
        let svc = service(MockAccounts::default());
        let account = AccountCredentials::new("alice", "secret-pw").with_email("a@example.org");

        let session = svc.register(&account).expect("Registration succeeds");
        assert_eq!(session.username.as_deref(), Some("alice"));

        let stored = svc.current_session().expect("Should load");
        assert_eq!(
            stored.require_credential().expect("Credential stored").expose(),
            "key-alice"
        );
        assert!(!stored.offline);
    }

    #[test]
    fn test_register_conflict() {
        let svc = service(MockAccounts::with_user("alice", "secret-pw"));
        let err = svc
            .register(&AccountCredentials::new("alice", "other-pw"))
            .expect_err("Duplicate username");
        assert!(matches!(err, AuthError::Conflict));
        assert!(!svc.current_session().expect("Should load").has_credential());
    }

    #[test]
    fn test_short_values_rejected_locally() {
        let api = MockAccounts::default();
        let svc = service(api);

        let err = svc
            .register(&AccountCredentials::new("a", "secret-pw"))
            .expect_err("Username too short");
        assert!(matches!(err, AuthError::Validation(_)));

        let err = svc
            .register(&AccountCredentials::new("alice", "12345"))
            .expect_err("Password too short");
        assert!(matches!(err, AuthError::Validation(_)));

        assert_eq!(svc.api.requests(), 0);
    }

    #[test]
    fn test_login_and_logout() {
        let svc = service(MockAccounts::with_user("bob", "hunter22"));
        let mut account = AccountCredentials::new("bob", "hunter22");
        account.role = Role::Admin;

        let session = svc.login(&account).expect("Login succeeds");
        assert!(session.is_admin());
        assert!(svc.current_session().expect("Should load").has_credential());

        svc.logout().expect("Logout succeeds");
        let after = svc.current_session().expect("Should load");
        assert!(!after.has_credential());
        assert!(after.username.is_none());
        assert_eq!(after.role, Role::User);
    }

    #[test]
    fn test_login_wrong_password() {
        let svc = service(MockAccounts::with_user("bob", "hunter22"));
        let err = svc
            .login(&AccountCredentials::new("bob", "wrong-password"))
            .expect_err("Wrong password");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_login_clears_offline_flag() {
        let svc = service(MockAccounts::with_user("carol", "password1"));
        svc.enter_offline_mode("carol").expect("Offline mode");
        assert!(svc.current_session().expect("Should load").offline);

        svc.login(&AccountCredentials::new("carol", "password1"))
            .expect("Login succeeds");
        assert!(!svc.current_session().expect("Should load").offline);
    }

    #[test]
    fn test_offline_mode_has_no_credential() {
        let svc = service(MockAccounts::with_user("dave", "password1"));
        svc.login(&AccountCredentials::new("dave", "password1"))
            .expect("Login succeeds");

        let session = svc.enter_offline_mode(" dave ").expect("Offline mode");
        assert!(session.offline);
        assert!(!session.has_credential());
        assert_eq!(session.username.as_deref(), Some("dave"));
        assert!(!svc.current_session().expect("Should load").has_credential());
    }

    #[test]
    fn test_update_profile_rotates_credential() {
        let api = MockAccounts {
            rotate_on_rename: true,
            ..MockAccounts::with_user("erin", "password1")
        };
        let svc = service(api);
        svc.login(&AccountCredentials::new("erin", "password1"))
            .expect("Login succeeds");

        let update = ProfileUpdate {
            new_username: Some("erin2".into()),
            new_password: None,
        };
        let session = svc.update_profile(&update).expect("Update succeeds");

        assert_eq!(session.username.as_deref(), Some("erin2"));
        let stored = svc.current_session().expect("Should load");
        assert_eq!(
            stored.require_credential().expect("Credential stored").expose(),
            "key-erin2"
        );
    }

    #[test]
    fn test_update_profile_forbidden() {
        let api = MockAccounts {
            update_status: Some(403),
            ..MockAccounts::with_user("frank", "password1")
        };
        let svc = service(api);
        svc.login(&AccountCredentials::new("frank", "password1"))
            .expect("Login succeeds");

        let update = ProfileUpdate {
            new_username: None,
            new_password: Some("password2".into()),
        };
        let err = svc.update_profile(&update).expect_err("Backend refuses");
        assert!(matches!(err, AuthError::Forbidden));
        assert!(matches!(
            svc.update_profile(&ProfileUpdate::default()),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_update_profile_requires_login() {
        let svc = service(MockAccounts::default());
        let update = ProfileUpdate {
            new_username: Some("ghost2".into()),
            new_password: None,
        };

        let err = svc.update_profile(&update).expect_err("Anonymous session");
        assert!(matches!(err, AuthError::Unauthenticated(_)));

        svc.enter_offline_mode("ghost").expect("Offline mode");
        let err = svc.update_profile(&update).expect_err("Offline session");
        assert!(matches!(err, AuthError::Unauthenticated(_)));
        assert_eq!(svc.api.requests(), 0);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(AuthError::from(status(400)), AuthError::Validation(_)));
        assert!(matches!(AuthError::from(status(500)), AuthError::Api(_)));
        assert!(matches!(
            AuthError::from(ApiError::Transport("refused".into())),
            AuthError::Api(_)
        ));
    }
}
