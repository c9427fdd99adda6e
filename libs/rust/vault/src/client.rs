//! Vault HTTP transport.
//!
//! Every call is logged before it is sent. Non-2xx responses, network errors
//! and undecodable bodies come back as `Err` after being logged with the
//! method, path, status and body; nothing here panics on a bad response.

use crate::{
    config::VaultSettings,
    error::{VaultError, VaultResult},
};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use url::Url;

/// Whether a request carries the active bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

/// HTTP transport bound to one Vault address and one active bearer token.
///
/// Clones share the token cell. [`VaultTransport::fork_with_token`] shares the
/// connection pool but starts an independent token lineage.
#[derive(Clone)]
pub struct VaultTransport {
    http: Client,
    base: Url,
    token: Arc<RwLock<SecretString>>,
}

impl std::fmt::Debug for VaultTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultTransport")
            .field("base", &self.base.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl VaultTransport {
    /// Create a transport using the settings' address, default token and timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &VaultSettings) -> VaultResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(&settings.user_agent)
            .use_rustls_tls()
            .build()
            .map_err(VaultError::Http)?;

        Ok(Self::with_client(
            http,
            settings.address.clone(),
            settings.default_token.clone(),
        ))
    }

    /// Create a transport around an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client, base: Url, token: SecretString) -> Self {
        let base = with_trailing_slash(base);
        info!(base_address = %base, "Vault transport initialized");

        Self {
            http,
            base,
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Start a new token lineage on the same connection pool.
    #[must_use]
    pub fn fork_with_token(&self, token: SecretString) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Snapshot of the active bearer token.
    pub async fn active_token(&self) -> SecretString {
        self.token.read().await.clone()
    }

    /// Swap in a new bearer token for all subsequent requests.
    pub async fn replace_token(&self, token: SecretString) {
        *self.token.write().await = token;
    }

    /// Resolve `path` against the base address.
    ///
    /// Leading slashes are ignored so `/v1/x` and `v1/x` address the same
    /// resource, including when the base address carries a path prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn url(&self, path: &str) -> VaultResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Send a request with the active bearer token and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// Returns an error for network failures, non-2xx statuses and
    /// undecodable bodies. All of them are logged before returning.
    pub async fn send<T, B>(&self, method: Method, path: &str, payload: Option<&B>) -> VaultResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.dispatch(method, path, payload, Auth::Bearer).await
    }

    /// `GET` with the active bearer token.
    ///
    /// # Errors
    ///
    /// See [`VaultTransport::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> VaultResult<T> {
        self.dispatch::<T, ()>(Method::GET, path, None, Auth::Bearer)
            .await
    }

    /// `POST` a JSON body with the active bearer token.
    ///
    /// # Errors
    ///
    /// See [`VaultTransport::send`].
    pub async fn post<T, B>(&self, path: &str, payload: &B) -> VaultResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.dispatch(Method::POST, path, Some(payload), Auth::Bearer)
            .await
    }

    /// `POST` a JSON body without an `Authorization` header.
    ///
    /// # Errors
    ///
    /// See [`VaultTransport::send`].
    pub async fn post_anonymous<T, B>(&self, path: &str, payload: &B) -> VaultResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.dispatch(Method::POST, path, Some(payload), Auth::Anonymous)
            .await
    }

    async fn dispatch<T, B>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&B>,
        auth: Auth,
    ) -> VaultResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let mut request = self.http.request(method.clone(), url);

        if auth == Auth::Bearer {
            // Clone out of the lock so a concurrent swap never waits on I/O.
            let token = self.active_token().await;
            if !token.expose_secret().is_empty() {
                request = request.bearer_auth(token.expose_secret());
            }
        }

        if let Some(body) = payload {
            request = request.json(body);
        }

        info!(%method, path, "Sending request to Vault");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(%method, path, error = %e, "HTTP request to Vault could not be sent");
                return Err(VaultError::unavailable(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                %method,
                path,
                status = status.as_u16(),
                body = %body,
                "HTTP request to Vault failed"
            );
            return Err(VaultError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%method, path, error = %e, "Failed to read Vault response body");
                return Err(VaultError::unavailable(e.to_string()));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(%method, path, error = %e, "Failed to decode Vault response");
            VaultError::from(e)
        })
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
