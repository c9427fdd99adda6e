//! Vault session configuration.

use crate::error::{VaultError, VaultResult};
use crate::source::ConfigSource;
use secrecy::SecretString;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Vault address used when none is configured.
pub const DEFAULT_VAULT_ADDRESS: &str = "http://localhost:8200";

/// Configuration keys understood by [`VaultSettings::from_source`].
pub mod keys {
    /// Vault base address
    pub const ADDRESS: &str = "Vault:Address";
    /// Bootstrap token attached to every request until an AppRole login replaces it
    pub const DEFAULT_TOKEN: &str = "Vault:DefaultToken";
    /// AppRole role id
    pub const ROLE_ID: &str = "Vault:RoleId";
    /// AppRole role name used to mint secret ids
    pub const ROLE_NAME: &str = "Vault:RoleName";
    /// KV v2 path of the application secret
    pub const SECRET_PATH: &str = "Vault:SecretPath";
    /// Seconds between renewal ticks
    pub const RENEW_INTERVAL_SECS: &str = "Vault:RenewIntervalSecs";
    /// Renewal increment sent to Vault
    pub const RENEW_INCREMENT: &str = "Vault:RenewIncrement";
    /// HTTP request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "Vault:RequestTimeoutSecs";
}

/// Vault session configuration.
///
/// Loaded once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Vault server address
    pub address: Url,
    /// Bootstrap token; may be empty
    pub default_token: SecretString,
    /// AppRole role id, required by the AppRole exchange
    pub role_id: Option<String>,
    /// AppRole role name
    pub role_name: String,
    /// KV v2 secret path, relative to `/v1/`
    pub secret_path: String,
    /// Interval between lookup/renew ticks
    pub renew_interval: Duration,
    /// Renewal increment (Vault duration string)
    pub renew_increment: String,
    /// TTL requested for minted secret ids
    pub secret_id_ttl: Duration,
    /// Use count requested for minted secret ids
    pub secret_id_num_uses: u32,
    /// Metadata attached to minted secret ids
    pub secret_id_metadata: serde_json::Value,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            address: default_address(),
            default_token: SecretString::from(String::new()),
            role_id: None,
            role_name: "developer".to_string(),
            secret_path: "secret/data/demo".to_string(),
            renew_interval: Duration::from_secs(60),
            renew_increment: "1h".to_string(),
            secret_id_ttl: Duration::from_secs(600),
            secret_id_num_uses: 50,
            secret_id_metadata: json!({ "tag": "development" }),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("vault-session/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[allow(clippy::expect_used)]
fn default_address() -> Url {
    Url::parse(DEFAULT_VAULT_ADDRESS).expect("default Vault address is a valid URL")
}

impl VaultSettings {
    /// Create a new configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is not a valid URL.
    pub fn new(address: &str, default_token: impl Into<String>) -> VaultResult<Self> {
        Ok(Self {
            address: parse_address(address)?,
            default_token: SecretString::from(default_token.into()),
            ..Default::default()
        })
    }

    /// Build settings from a configuration source.
    ///
    /// A missing role id is not an error here; the AppRole exchange reports
    /// it when it needs it.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but malformed.
    pub fn from_source(source: &dyn ConfigSource) -> VaultResult<Self> {
        let mut settings = Self::default();

        if let Some(address) = source.get(keys::ADDRESS) {
            settings.address = parse_address(&address)?;
        }
        if let Some(token) = source.get(keys::DEFAULT_TOKEN) {
            settings.default_token = SecretString::from(token);
        }
        settings.role_id = source.get(keys::ROLE_ID).filter(|id| !id.trim().is_empty());
        if let Some(role_name) = source.get(keys::ROLE_NAME) {
            settings.role_name = role_name;
        }
        if let Some(path) = source.get(keys::SECRET_PATH) {
            settings.secret_path = path;
        }
        if let Some(secs) = parse_value::<u64>(source, keys::RENEW_INTERVAL_SECS)? {
            if secs == 0 {
                return Err(VaultError::invalid_config(format!(
                    "{} must be greater than zero",
                    keys::RENEW_INTERVAL_SECS
                )));
            }
            settings.renew_interval = Duration::from_secs(secs);
        }
        if let Some(increment) = source.get(keys::RENEW_INCREMENT) {
            settings.renew_increment = increment;
        }
        if let Some(secs) = parse_value::<u64>(source, keys::REQUEST_TIMEOUT_SECS)? {
            settings.request_timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    /// Set the AppRole role id.
    #[must_use]
    pub fn with_role_id(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    /// Set the renewal interval.
    #[must_use]
    pub const fn with_renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = interval;
        self
    }

    /// Set the KV secret path.
    #[must_use]
    pub fn with_secret_path(mut self, path: impl Into<String>) -> Self {
        self.secret_path = path.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Role id, or the configuration error the exchange must surface.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] when no role id is configured.
    pub fn require_role_id(&self) -> VaultResult<&str> {
        self.role_id.as_deref().ok_or_else(|| {
            VaultError::invalid_config(format!("{} is not configured", keys::ROLE_ID))
        })
    }
}

fn parse_address(address: &str) -> VaultResult<Url> {
    Url::parse(address)
        .map_err(|e| VaultError::invalid_config(format!("{}: {e}", keys::ADDRESS)))
}

fn parse_value<T>(source: &dyn ConfigSource, key: &str) -> VaultResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    source
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| VaultError::invalid_config(format!("{key}: {e}")))
        })
        .transpose()
}
