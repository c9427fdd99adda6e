//! Centralized configuration for the Vault agent.
//!
//! Values come from an optional `appsettings.json`, overridden by environment
//! variables (`.env` is loaded first). Vault keys use the `Vault:*` names,
//! mapped to `VAULT__*` in the environment.

use std::env;
use std::time::Duration;
use vault_session::{
    ConfigSource, EnvSource, JsonFileSource, LayeredSource, VaultError, VaultResult, VaultSettings,
};

/// Settings file read when `APPSETTINGS_PATH` is unset.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> VaultResult<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(VaultError::invalid_config(format!("Invalid log format: {other}"))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl LogConfig {
    /// Read `LOG_LEVEL` and `LOG_FORMAT`.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOG_FORMAT` is not recognised.
    pub fn from_env() -> VaultResult<Self> {
        Ok(Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default())?,
        })
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Vault session settings
    pub vault: VaultSettings,
    /// How long shutdown waits for background tasks
    pub shutdown_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from the settings file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is malformed or a value is invalid.
    pub fn from_env() -> VaultResult<Self> {
        let settings_path =
            env::var("APPSETTINGS_PATH").unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_string());

        let source = LayeredSource::new()
            .layer(JsonFileSource::load(&settings_path)?)
            .layer(EnvSource);

        Self::from_source(&source)
    }

    /// Build configuration from any source.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but invalid.
    pub fn from_source(source: &dyn ConfigSource) -> VaultResult<Self> {
        let vault = VaultSettings::from_source(source)?;

        let shutdown_timeout = match source.get("Agent:ShutdownTimeoutSecs") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|e| {
                VaultError::invalid_config(format!("Agent:ShutdownTimeoutSecs: {e}"))
            })?),
            None => Duration::from_secs(30),
        };

        Ok(Self {
            vault,
            shutdown_timeout,
        })
    }
}
