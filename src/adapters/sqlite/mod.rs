//! SQLite adapter: Implementation of SessionStore.
//!
//! Persists the session between CLI invocations as a small key/value table,
//! the local equivalent of a browser's local storage.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex is reported as
//! `StoreError::Poisoned` rather than panicking.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{Credential, Role, SessionContext};
use crate::ports::SessionStore;

const KEY_API_KEY: &str = "api_key";
const KEY_USERNAME: &str = "username";
const KEY_ROLE: &str = "user_role";
const KEY_OFFLINE: &str = "is_offline_mode";

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

/// SQLite session store adapter.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the session store at the given path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    fn get(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
        let value = conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(conn: &Connection, key: &str, value: &str, now: &str) -> Result<(), StoreError> {
        conn.execute(
            "INSERT OR REPLACE INTO session (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, now],
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    type Error = StoreError;

    fn load(&self) -> Result<SessionContext, Self::Error> {
        let conn = self.lock()?;

        let credential = Self::get(&conn, KEY_API_KEY)?
            .filter(|token| !token.trim().is_empty())
            .map(Credential::new);
        let username = Self::get(&conn, KEY_USERNAME)?;
        let role = Self::get(&conn, KEY_ROLE)?
            .map(|r| Role::parse(&r))
            .unwrap_or_default();
        let offline = Self::get(&conn, KEY_OFFLINE)?.as_deref() == Some("true");

        Ok(SessionContext {
            credential,
            username,
            role,
            offline,
        })
    }

    fn save(&self, session: &SessionContext) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        let now = chrono::Utc::now().to_rfc3339();

        // Replace atomically so a crash never leaves a half-written session.
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM session", [])?;
        if let Some(credential) = &session.credential {
            Self::put(&tx, KEY_API_KEY, credential.expose(), &now)?;
        }
        if let Some(username) = &session.username {
            Self::put(&tx, KEY_USERNAME, username, &now)?;
        }
        Self::put(&tx, KEY_ROLE, session.role.as_str(), &now)?;
        Self::put(&tx, KEY_OFFLINE, if session.offline { "true" } else { "false" }, &now)?;
        tx.commit()?;

        tracing::debug!(
            "Saved session (credential: {})",
            session
                .credential
                .as_ref()
                .map_or("none", Credential::fingerprint)
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM session", [])?;
        tracing::info!("Cleared session store");
        Ok(())
    }
}
