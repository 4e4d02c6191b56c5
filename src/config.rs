use crate::error::ConfigError;
use crate::session::{RerunPolicy, SessionMode};
use std::net::SocketAddr;

pub const ENV_ADDR: &str = "REVIEW_SHEET_ADDR";
pub const ENV_MODE: &str = "REVIEW_SHEET_MODE";
pub const ENV_MAX_UPLOAD_MB: &str = "REVIEW_SHEET_MAX_UPLOAD_MB";
pub const ENV_ENGINE_RERUN: &str = "REVIEW_SHEET_ENGINE_RERUN";
pub const ENV_MAX_SESSIONS: &str = "REVIEW_SHEET_MAX_SESSIONS";

/// Runtime settings shared by the web server and the command-line tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub mode: SessionMode,
    pub max_upload_bytes: usize,
    pub rerun_policy: RerunPolicy,
    /// Sessions the web server keeps before evicting the least recently used.
    pub max_sessions: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            mode: SessionMode::Finalize,
            max_upload_bytes: 20 * 1024 * 1024,
            rerun_policy: RerunPolicy::Merge,
            max_sessions: 64,
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(value) = lookup(ENV_ADDR) {
            config.bind_addr = value.parse().map_err(|e: std::net::AddrParseError| {
                invalid(ENV_ADDR, &value, e.to_string())
            })?;
        }
        if let Some(value) = lookup(ENV_MODE) {
            config.mode = value
                .parse()
                .map_err(|e: String| invalid(ENV_MODE, &value, e))?;
        }
        if let Some(value) = lookup(ENV_MAX_UPLOAD_MB) {
            let mb = positive(ENV_MAX_UPLOAD_MB, &value)?;
            config.max_upload_bytes = mb.checked_mul(1024 * 1024).ok_or_else(|| {
                invalid(ENV_MAX_UPLOAD_MB, &value, "too large".to_string())
            })?;
        }
        if let Some(value) = lookup(ENV_MAX_SESSIONS) {
            config.max_sessions = positive(ENV_MAX_SESSIONS, &value)?;
        }
        if let Some(value) = lookup(ENV_ENGINE_RERUN) {
            config.rerun_policy = value
                .parse()
                .map_err(|e: String| invalid(ENV_ENGINE_RERUN, &value, e))?;
        }

        Ok(config)
    }
}

fn positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    let n: usize = value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(key, value, e.to_string()))?;
    if n == 0 {
        return Err(invalid(key, value, "must be positive".to_string()));
    }
    Ok(n)
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    }
}
