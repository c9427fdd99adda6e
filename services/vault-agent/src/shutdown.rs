//! Graceful shutdown.
//!
//! Background tasks share one cancellation token and are tracked in a
//! `JoinSet`. Shutdown cancels the token and waits for the tasks, aborting
//! whatever is still running once the timeout expires.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Shutdown coordinator for graceful termination.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: JoinSet<()>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Token cancelled when shutdown begins.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawns a tracked background task.
    ///
    /// The task is expected to watch the token itself; it is only aborted if
    /// it outlives the shutdown timeout.
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(async move {
            future.await;
            info!(task = name, "Background task completed");
        });
    }

    /// Cancels the token and waits up to `timeout` for tasks to finish.
    pub async fn shutdown(mut self, timeout: Duration) {
        info!("Initiating graceful shutdown");
        self.token.cancel();

        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "Task failed during shutdown");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timeout reached, aborting remaining tasks");
            self.tasks.abort_all();
        }

        info!("Shutdown complete");
    }

    /// Returns the number of active tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for SIGTERM or SIGINT.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}
