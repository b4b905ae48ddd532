//! services/reader/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Base URL of the conversion API when `API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    /// Postgres backend for identities and documents. In-memory when absent.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Where the signed-in uid is remembered between runs.
    pub session_file: Option<PathBuf>,
    pub http_timeout: Duration,
    /// How long navigation waits for the first identity verdict.
    pub session_timeout: Duration,
    pub min_password_length: usize,
    pub max_failed_sign_ins: usize,
    pub detect_edit_conflicts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            database_url: None,
            log_level: Level::INFO,
            session_file: None,
            http_timeout: Duration::from_secs(30),
            session_timeout: Duration::from_secs(5),
            min_password_length: 6,
            max_failed_sign_ins: 5,
            detect_edit_conflicts: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // --- Remote API & Storage ---
        let api_url = lookup("API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_url),
            ));
        }

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_file = lookup("SESSION_FILE").map(PathBuf::from);

        // --- Client Behaviour ---
        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", &raw)?),
            None => defaults.http_timeout,
        };
        let session_timeout = match lookup("SESSION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("SESSION_TIMEOUT_SECS", &raw)?),
            None => defaults.session_timeout,
        };
        let min_password_length = match lookup("MIN_PASSWORD_LENGTH") {
            Some(raw) => parse_var("MIN_PASSWORD_LENGTH", &raw)?,
            None => defaults.min_password_length,
        };
        let max_failed_sign_ins = match lookup("MAX_FAILED_SIGN_INS") {
            Some(raw) => parse_var("MAX_FAILED_SIGN_INS", &raw)?,
            None => defaults.max_failed_sign_ins,
        };
        let detect_edit_conflicts = match lookup("DETECT_EDIT_CONFLICTS") {
            Some(raw) => parse_var("DETECT_EDIT_CONFLICTS", &raw)?,
            None => defaults.detect_edit_conflicts,
        };

        Ok(Self {
            api_url,
            database_url,
            log_level,
            session_file,
            http_timeout,
            session_timeout,
            min_password_length,
            max_failed_sign_ins,
            detect_edit_conflicts,
        })
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn api_url_defaults_to_local_address() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.database_url.is_none());
        assert_eq!(config.min_password_length, 6);
        assert!(!config.detect_edit_conflicts);
    }

    #[test]
    fn trailing_slash_is_stripped_from_api_url() {
        let config = load(&[("API_URL", "https://convert.example.com/")]).unwrap();
        assert_eq!(config.api_url, "https://convert.example.com");
    }

    #[test]
    fn rejects_non_http_api_url() {
        let err = load(&[("API_URL", "ftp://nope")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "API_URL"));
    }

    #[test]
    fn rejects_bad_numbers_and_flags() {
        assert!(load(&[("HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("DETECT_EDIT_CONFLICTS", "maybe")]).is_err());
        let config = load(&[("DETECT_EDIT_CONFLICTS", "true"), ("HTTP_TIMEOUT_SECS", "5")]).unwrap();
        assert!(config.detect_edit_conflicts);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn session_timeout_is_read_in_seconds() {
        assert_eq!(load(&[]).unwrap().session_timeout, Duration::from_secs(5));
        let config = load(&[("SESSION_TIMEOUT_SECS", "12")]).unwrap();
        assert_eq!(config.session_timeout, Duration::from_secs(12));
        assert!(load(&[("SESSION_TIMEOUT_SECS", "-1")]).is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(load(&[("RUST_LOG", "chatty")]).is_err());
    }
}
