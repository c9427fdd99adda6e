//! Vault Agent - Main Entry Point
//!
//! Fetches the application secret once through AppRole at startup and keeps
//! the bootstrap token renewed until the process is asked to stop.

mod config;
mod observability;
mod shutdown;

use tracing::{error, info, warn};
use vault_session::{AppRoleLineage, VaultSession};

use crate::config::{AgentConfig, LogConfig};
use crate::observability::init_tracing;
use crate::shutdown::{ShutdownCoordinator, wait_for_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing(&LogConfig::from_env()?);
    info!("Starting Vault agent");

    let config = AgentConfig::from_env()?;
    let session = VaultSession::new(config.vault)?;

    let mut coordinator = ShutdownCoordinator::new();

    let scheduler = session.scheduler(coordinator.token());
    coordinator.spawn("token-renewal", async move {
        scheduler.run().await;
    });

    let lineage = session.approle_lineage();
    coordinator.spawn("startup-secret-fetch", fetch_secret_at_startup(lineage));
    info!(tasks = coordinator.task_count(), "Background tasks started");

    wait_for_signal().await;
    coordinator.shutdown(config.shutdown_timeout).await;

    info!("Vault agent stopped");
    Ok(())
}

async fn fetch_secret_at_startup(lineage: AppRoleLineage) {
    info!("Fetching key-value secret from Vault");

    match lineage.fetch_secret().await {
        Ok(Some(secret)) => info!(
            host = %secret.host,
            port = secret.port,
            user = %secret.user,
            database = %secret.name,
            version = ?secret.version,
            "Key-value secret fetched"
        ),
        Ok(None) => warn!("Key-value secret is not available"),
        Err(e) => error!(error = %e, "Error fetching key-value secret from Vault"),
    }
}
