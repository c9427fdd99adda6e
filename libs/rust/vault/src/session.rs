//! Wiring of the two token lineages.
//!
//! The bootstrap lineage carries the configured default token and is kept
//! alive by the renewal scheduler. The AppRole lineage starts from the same
//! default token, swaps in the AppRole client token, and reads the secret.
//! They share the HTTP connection pool and nothing else.

use crate::{
    approle::AppRoleExchanger,
    client::VaultTransport,
    config::VaultSettings,
    error::{VaultError, VaultResult},
    fetcher::SecretFetcher,
    lifecycle::TokenLifecycleController,
    scheduler::Scheduler,
    secrets::DatabaseSecret,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Entry point holding configuration and the bootstrap transport.
#[derive(Debug, Clone)]
pub struct VaultSession {
    settings: Arc<VaultSettings>,
    bootstrap: VaultTransport,
}

impl VaultSession {
    /// Create a session from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: VaultSettings) -> VaultResult<Self> {
        let bootstrap = VaultTransport::new(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            bootstrap,
        })
    }

    /// Settings the session was built from.
    #[must_use]
    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Transport carrying the bootstrap token.
    #[must_use]
    pub const fn bootstrap_transport(&self) -> &VaultTransport {
        &self.bootstrap
    }

    /// Lifecycle controller for the bootstrap token.
    #[must_use]
    pub fn lifecycle(&self) -> TokenLifecycleController {
        TokenLifecycleController::from_settings(self.bootstrap.clone(), &self.settings)
    }

    /// Renewal scheduler for the bootstrap token, stopped by `cancel`.
    #[must_use]
    pub fn scheduler(&self, cancel: CancellationToken) -> Scheduler {
        Scheduler::new(
            Arc::new(self.lifecycle()),
            self.settings.renew_interval,
            cancel,
        )
    }

    /// A fresh AppRole lineage starting from the default token.
    #[must_use]
    pub fn approle_lineage(&self) -> AppRoleLineage {
        let transport = self
            .bootstrap
            .fork_with_token(self.settings.default_token.clone());
        AppRoleLineage {
            exchanger: AppRoleExchanger::new(transport.clone(), Arc::clone(&self.settings)),
            fetcher: SecretFetcher::new(transport.clone(), self.settings.secret_path.clone()),
            transport,
        }
    }
}

/// AppRole login followed by the secret read, over one token lineage.
#[derive(Debug, Clone)]
pub struct AppRoleLineage {
    transport: VaultTransport,
    exchanger: AppRoleExchanger,
    fetcher: SecretFetcher,
}

impl AppRoleLineage {
    /// Transport whose token the exchange replaces.
    #[must_use]
    pub const fn transport(&self) -> &VaultTransport {
        &self.transport
    }

    /// Exchanger for this lineage.
    #[must_use]
    pub const fn exchanger(&self) -> &AppRoleExchanger {
        &self.exchanger
    }

    /// Fetcher for this lineage.
    #[must_use]
    pub const fn fetcher(&self) -> &SecretFetcher {
        &self.fetcher
    }

    /// Log in through AppRole, then read the secret.
    ///
    /// A failed exchange leaves the previous token active and the read goes
    /// ahead with it. `Ok(None)` means the secret could not be read.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] when no role id is configured;
    /// the read is not attempted in that case.
    #[instrument(skip(self))]
    pub async fn fetch_secret(&self) -> VaultResult<Option<DatabaseSecret>> {
        info!("Attempting to fetch KV from Vault");

        match self.exchanger.authenticate().await {
            Ok(()) => {}
            Err(e @ VaultError::InvalidConfig(_)) => return Err(e),
            Err(e) => warn!(error = %e, "AppRole exchange failed, keeping the previous token"),
        }

        Ok(self.fetcher.fetch().await)
    }
}
