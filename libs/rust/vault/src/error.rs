//! Vault error types using thiserror 2.0.
//!
//! Every failure the session can observe is a variant here. None of them is
//! fatal to the renewal loop; callers decide whether an error halts the
//! operation at hand (missing configuration) or only degrades it to an
//! absent result (transport and exchange failures).

use thiserror::Error;

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Vault server unreachable
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// Vault answered with a non-2xx status
    #[error("Vault returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body, as returned by Vault
        body: String,
    },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// AppRole exchange produced no usable token
    #[error("AppRole exchange failed: {0}")]
    ExchangeFailed(String),

    /// Secret was read but held no usable value
    #[error("Secret unavailable at path: {0}")]
    SecretUnavailable(String),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Check if error is transient.
    ///
    /// Nothing retries automatically; the flag is logged so operators can
    /// tell a flapping server from a misconfiguration.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Status code, when the failure came from a Vault response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a secret unavailable error.
    #[must_use]
    pub fn secret_unavailable(path: impl Into<String>) -> Self {
        Self::SecretUnavailable(path.into())
    }

    /// Create an exchange failed error.
    #[must_use]
    pub fn exchange_failed(msg: impl Into<String>) -> Self {
        Self::ExchangeFailed(msg.into())
    }
}
