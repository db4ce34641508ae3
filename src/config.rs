//! Runtime configuration sourced from the environment.
//!
//! Supported:
//! - CARDIOPREDICT_API_URL (default `http://localhost:8081`)
//! - CARDIOPREDICT_API_TIMEOUT_SECS (default 10, 0 disables the timeout)
//! - CARDIOPREDICT_SESSION_DB (default `cardiopredict-session.db`)
//! - CARDIOPREDICT_JITTER_SEED (optional u64, reproducible fallback scores)

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8081";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_DB: &str = "cardiopredict-session.db";

const API_URL_ENV: &str = "CARDIOPREDICT_API_URL";
const TIMEOUT_ENV: &str = "CARDIOPREDICT_API_TIMEOUT_SECS";
const SESSION_DB_ENV: &str = "CARDIOPREDICT_SESSION_DB";
const JITTER_SEED_ENV: &str = "CARDIOPREDICT_JITTER_SEED";

/// A configuration value could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for {var}: {value:?} ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the prediction backend
    pub api_url: Url,

    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,

    /// Path of the SQLite session store
    pub session_db: PathBuf,

    /// Seed for the fallback jitter; `None` seeds from OS entropy
    pub jitter_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("Default API URL is valid"),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            session_db: PathBuf::from(DEFAULT_SESSION_DB),
            jitter_seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` naming the first variable with an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` naming the first variable with an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup(API_URL_ENV) {
            cfg.api_url = parse_api_url(API_URL_ENV, &v)?;
        }

        if let Some(v) = lookup(TIMEOUT_ENV) {
            let secs = v.trim().parse::<u64>().map_err(|e| ConfigError {
                var: TIMEOUT_ENV,
                value: v.clone(),
                reason: e.to_string(),
            })?;
            cfg.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(v) = lookup(SESSION_DB_ENV) {
            if v.trim().is_empty() {
                return Err(ConfigError {
                    var: SESSION_DB_ENV,
                    value: v,
                    reason: "path is empty".to_string(),
                });
            }
            cfg.session_db = PathBuf::from(v.trim());
        }

        if let Some(v) = lookup(JITTER_SEED_ENV) {
            let seed = v.trim().parse::<u64>().map_err(|e| ConfigError {
                var: JITTER_SEED_ENV,
                value: v.clone(),
                reason: e.to_string(),
            })?;
            cfg.jitter_seed = Some(seed);
        }

        Ok(cfg)
    }

    /// Override the API URL (e.g. from a CLI flag).
    ///
    /// # Errors
    /// Returns `ConfigError` if the URL is not an absolute http(s) URL.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url("--api-url", raw)?;
        Ok(self)
    }
}

fn parse_api_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError {
        var,
        value: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).expect("Defaults are valid");
        assert_eq!(cfg.api_url.as_str(), "http://localhost:8081/");
        assert_eq!(cfg.timeout, Some(Duration::from_secs(10)));
        assert_eq!(cfg.session_db, PathBuf::from(DEFAULT_SESSION_DB));
        assert!(cfg.jitter_seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://cardio.example.org/api"),
            (TIMEOUT_ENV, "0"),
            (SESSION_DB_ENV, "/tmp/session.db"),
            (JITTER_SEED_ENV, "42"),
        ]))
        .expect("Overrides are valid");

        assert_eq!(cfg.api_url.host_str(), Some("cardio.example.org"));
        assert!(cfg.timeout.is_none());
        assert_eq!(cfg.session_db, PathBuf::from("/tmp/session.db"));
        assert_eq!(cfg.jitter_seed, Some(42));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")]))
            .expect_err("Non-numeric timeout");
        assert_eq!(err.var, TIMEOUT_ENV);

        let err = AppConfig::from_lookup(lookup(&[(API_URL_ENV, "ftp://example.org")]))
            .expect_err("Unsupported scheme");
        assert_eq!(err.var, API_URL_ENV);

        let err = AppConfig::default()
            .with_api_url("not a url")
            .expect_err("Unparseable URL");
        assert_eq!(err.var, "--api-url");
    }
}
