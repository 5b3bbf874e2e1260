//! Configuration module for environment variable parsing.
//!
//! Configuration is read once at startup, after an optional `.env` file has
//! been merged into the process environment. Missing required values or
//! unparsable optional ones are reported as a [`ConfigError`] so the binary
//! can exit before serving any traffic.

use std::env;
use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

/// Env file read by [`Config::load`], relative to the working directory.
pub const ENV_FILE: &str = ".env";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default route for the webhook endpoints.
pub const DEFAULT_WEBHOOK_PATH: &str = "/facebook";

/// Default number of events retained in memory.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Shared secret used to sign webhook payloads
    pub app_secret: String,

    /// Token the platform must present during the subscription handshake
    pub verify_token: String,

    /// Address for the web server to bind to
    pub host: IpAddr,

    /// Port for the web server to listen on
    pub port: u16,

    /// Route serving both the handshake (GET) and ingestion (POST)
    pub webhook_path: String,

    /// Maximum number of events kept in the event log
    pub event_log_capacity: usize,
}

impl Config {
    /// Merge `.env` into the environment, then load configuration.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env_file(ENV_FILE)
    }

    /// Merge `path` into the environment, then load configuration.
    ///
    /// A missing file is not an error. Variables already set in the process
    /// environment take precedence over the file.
    pub fn load_with_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match dotenvy::from_path(path) {
            Ok(()) => info!(path = %path.display(), "env_file_loaded"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(path = %path.display(), error = %e, "env_file_invalid"),
        }

        Self::from_env()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_secret = required(&lookup, "APP_SECRET")?;
        let verify_token = required(&lookup, "TOKEN")?;

        let host = parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let webhook_path = lookup("WEBHOOK_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') || webhook_path == "/" || webhook_path == "/health" {
            return Err(ConfigError::Invalid {
                name: "WEBHOOK_PATH",
                value: webhook_path,
                reason: "must start with '/' and not collide with '/' or '/health'".to_string(),
            });
        }

        let event_log_capacity =
            parse_or(&lookup, "EVENT_LOG_CAPACITY", DEFAULT_EVENT_LOG_CAPACITY)?;
        if event_log_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENT_LOG_CAPACITY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            app_secret,
            verify_token,
            host,
            port,
            webhook_path,
            event_log_capacity,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_secret", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_path", &self.webhook_path)
            .field("event_log_capacity", &self.event_log_capacity)
            .finish()
    }
}

/// Read a variable that must be present and non-blank.
fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
