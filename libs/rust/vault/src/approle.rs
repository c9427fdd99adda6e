//! AppRole credential exchange.
//!
//! Two steps, strictly in order and never retried: mint a single-use secret
//! id for the role, then log in with `(role_id, secret_id)`. Either step
//! coming back empty empties the whole exchange, and the login step is not
//! attempted without a secret id. A missing role id fails the exchange
//! before either request is sent.

use crate::{
    client::VaultTransport,
    config::VaultSettings,
    error::{VaultError, VaultResult},
    secrets::{AppRoleLoginRequest, AuthResponse, SecretIdRequest, SecretIdResponse},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const LOGIN_PATH: &str = "/v1/auth/approle/login";

/// Turns the configured AppRole into a client token.
#[derive(Debug, Clone)]
pub struct AppRoleExchanger {
    transport: VaultTransport,
    settings: Arc<VaultSettings>,
}

impl AppRoleExchanger {
    /// Create an exchanger that authenticates over `transport`.
    #[must_use]
    pub const fn new(transport: VaultTransport, settings: Arc<VaultSettings>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Run the exchange and make the resulting token active on the transport.
    ///
    /// On failure the previously active token stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if no role id is configured and
    /// [`VaultError::ExchangeFailed`] if either step produced nothing.
    #[instrument(skip(self), fields(role = %self.settings.role_name))]
    pub async fn authenticate(&self) -> VaultResult<()> {
        let token = self.exchange().await?;
        self.transport.replace_token(token).await;
        info!("AppRole token is now active");
        Ok(())
    }

    /// Run both steps and return the client token without activating it.
    ///
    /// # Errors
    ///
    /// See [`AppRoleExchanger::authenticate`].
    pub async fn exchange(&self) -> VaultResult<SecretString> {
        // No secret id is minted without a role id to log in with.
        self.settings.require_role_id()?;

        let Some(secret_id) = self.generate_secret_id().await else {
            return Err(VaultError::exchange_failed("secret id generation returned nothing"));
        };

        self.login(&secret_id)
            .await?
            .ok_or_else(|| VaultError::exchange_failed("AppRole login returned no client token"))
    }

    /// Mint a single-use secret id. `None` when Vault returned nothing usable.
    pub async fn generate_secret_id(&self) -> Option<SecretString> {
        info!("Attempting to generate secret ID");

        let body = SecretIdRequest {
            metadata: self.settings.secret_id_metadata.to_string(),
            ttl: self.settings.secret_id_ttl.as_secs(),
            num_uses: self.settings.secret_id_num_uses,
        };
        let path = format!("/v1/auth/approle/role/{}/secret-id", self.settings.role_name);

        let data = self
            .transport
            .post::<SecretIdResponse, _>(&path, &body)
            .await
            .ok()?
            .data;

        if data.secret_id.is_empty() {
            warn!("Vault returned an empty secret ID");
            return None;
        }

        debug!(
            accessor = %data.secret_id_accessor,
            ttl_secs = data.secret_id_ttl,
            num_uses = data.secret_id_num_uses,
            "Secret ID generated"
        );
        Some(SecretString::from(data.secret_id))
    }

    /// Log in with the configured role id and `secret_id`.
    ///
    /// `Ok(None)` when Vault returned no token.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if no role id is configured.
    pub async fn login(&self, secret_id: &SecretString) -> VaultResult<Option<SecretString>> {
        info!("Attempting to generate AppRole token");

        let role_id = self.settings.require_role_id()?;
        let body = AppRoleLoginRequest {
            role_id,
            secret_id: secret_id.expose_secret(),
        };

        let Ok(response) = self
            .transport
            .post_anonymous::<AuthResponse, _>(LOGIN_PATH, &body)
            .await
        else {
            return Ok(None);
        };

        if response.auth.client_token.is_empty() {
            warn!("AppRole login returned an empty client token");
            return Ok(None);
        }

        info!(
            policies = ?response.auth.policies,
            lease_secs = response.auth.lease_duration,
            "AppRole token generated successfully"
        );
        Ok(Some(SecretString::from(response.auth.client_token)))
    }
}
