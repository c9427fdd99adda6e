//! Lookup and renewal of the bootstrap token.

use crate::{
    client::VaultTransport,
    config::VaultSettings,
    provider::{TokenLifecycle, TtlStatus},
    secrets::{AuthResponse, RenewSelfRequest, TokenLookupResponse},
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const LOOKUP_SELF_PATH: &str = "/v1/auth/token/lookup-self";
const RENEW_SELF_PATH: &str = "/v1/auth/token/renew-self";

/// Keeps the transport's own token alive.
///
/// Only reads the active token; it never replaces it, even after a
/// successful renewal, because Vault extends the same token in place.
#[derive(Debug, Clone)]
pub struct TokenLifecycleController {
    transport: VaultTransport,
    increment: String,
}

impl TokenLifecycleController {
    /// Create a controller for the token held by `transport`.
    #[must_use]
    pub fn new(transport: VaultTransport, increment: impl Into<String>) -> Self {
        Self {
            transport,
            increment: increment.into(),
        }
    }

    /// Create a controller with the increment from `settings`.
    #[must_use]
    pub fn from_settings(transport: VaultTransport, settings: &VaultSettings) -> Self {
        Self::new(transport, settings.renew_increment.clone())
    }
}

#[async_trait]
impl TokenLifecycle for TokenLifecycleController {
    #[instrument(skip(self))]
    async fn lookup(&self) -> TtlStatus {
        info!("Attempting to lookup Vault token");

        match self.transport.get::<TokenLookupResponse>(LOOKUP_SELF_PATH).await {
            Ok(response) => {
                let data = response.data;
                info!(ttl_secs = data.ttl, "Current token TTL");
                debug!(
                    display_name = %data.display_name,
                    policies = ?data.policies,
                    renewable = data.renewable,
                    expire_time = ?data.expire_time,
                    "Token details"
                );
                TtlStatus::Remaining(Duration::from_secs(data.ttl))
            }
            Err(e) => {
                error!(
                    error = %e,
                    status = ?e.status(),
                    retryable = e.is_retryable(),
                    "Failed to lookup Vault token"
                );
                info!(ttl = "TTL is not available", "Current token TTL");
                TtlStatus::Unavailable
            }
        }
    }

    #[instrument(skip(self))]
    async fn renew(&self) -> bool {
        info!(increment = %self.increment, "Attempting to renew Vault token");

        let body = RenewSelfRequest {
            increment: &self.increment,
        };
        match self.transport.post::<AuthResponse, _>(RENEW_SELF_PATH, &body).await {
            Ok(response) if response.auth.client_token.is_empty() => {
                warn!("Token renewal returned no token");
                false
            }
            Ok(response) => {
                debug!(
                    lease_duration = response.auth.lease_duration,
                    renewable = response.auth.renewable,
                    "Token renewal accepted"
                );
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    status = ?e.status(),
                    retryable = e.is_retryable(),
                    "Token renewal rejected"
                );
                false
            }
        }
    }
}
