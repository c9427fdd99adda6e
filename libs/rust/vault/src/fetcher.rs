//! KV v2 secret retrieval.

use crate::{
    client::VaultTransport,
    error::{VaultError, VaultResult},
    secrets::{DatabaseSecret, DemoSecretData, KvResponse},
};
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument};

/// Reads the application secret with whatever token is active on its transport.
#[derive(Debug, Clone)]
pub struct SecretFetcher {
    transport: VaultTransport,
    path: String,
}

impl SecretFetcher {
    /// Create a fetcher for the KV v2 `path` (relative to `/v1/`).
    #[must_use]
    pub fn new(transport: VaultTransport, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
        }
    }

    /// Read the database credential bundle. `None` if Vault did not return it
    /// or the stored block is empty.
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn fetch(&self) -> Option<DatabaseSecret> {
        info!("Attempting to fetch secret value from Vault");

        match self.read_database().await {
            Ok(secret) => Some(secret),
            Err(e) => {
                error!(error = %e, "Failed to fetch secret from Vault");
                None
            }
        }
    }

    async fn read_database(&self) -> VaultResult<DatabaseSecret> {
        let response = self.read_kv::<DemoSecretData>(&self.path).await?;
        DatabaseSecret::from_kv(response).ok_or_else(|| VaultError::secret_unavailable(&self.path))
    }

    /// Read and decode any KV v2 secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body does not match `T`.
    pub async fn read_kv<T: DeserializeOwned>(&self, path: &str) -> VaultResult<KvResponse<T>> {
        self.transport.get(&format!("v1/{}", path.trim_start_matches('/'))).await
    }
}
