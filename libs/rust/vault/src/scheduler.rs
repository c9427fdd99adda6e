//! Fixed-interval token renewal loop.

use crate::provider::{TokenLifecycle, TtlStatus};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Lookup result
    pub ttl: TtlStatus,
    /// Whether the renewal was accepted
    pub renewed: bool,
}

/// Runs lookup then renew every `interval` until cancelled.
///
/// Ticks never overlap. Cancellation interrupts the wait between ticks but
/// never a tick in progress; the loop exits once the current tick is done.
pub struct Scheduler {
    lifecycle: Arc<dyn TokenLifecycle>,
    interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler.
    #[must_use]
    pub fn new(
        lifecycle: Arc<dyn TokenLifecycle>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            lifecycle,
            interval,
            cancel,
        }
    }

    /// Interval between ticks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until cancelled. Returns the number of ticks started.
    pub async fn run(self) -> u64 {
        info!(interval_secs = self.interval.as_secs(), "Token renewal scheduler starting");

        let mut ticks = 0_u64;
        while !self.cancel.is_cancelled() {
            ticks += 1;

            // A tick runs in its own task so a panic is contained to it.
            let lifecycle = Arc::clone(&self.lifecycle);
            match tokio::spawn(async move { tick(lifecycle.as_ref()).await }).await {
                Ok(outcome) => debug!(
                    tick = ticks,
                    ttl_secs = ?outcome.ttl.remaining().map(|ttl| ttl.as_secs()),
                    renewed = outcome.renewed,
                    "Tick finished"
                ),
                Err(e) if e.is_cancelled() => {
                    info!(tick = ticks, "Token renewal tick was cancelled");
                }
                Err(e) => error!(tick = ticks, error = %e, "Token renewal tick failed"),
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Token renewal wait cancelled");
                    break;
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(ticks, "Token renewal scheduler is stopping");
        ticks
    }
}

/// One lookup followed by one renewal.
pub async fn tick(lifecycle: &dyn TokenLifecycle) -> TickOutcome {
    info!(time = %Utc::now().to_rfc3339(), "Timer triggered");
    debug!("Attempting to renew Vault token");

    let ttl = lifecycle.lookup().await;
    let renewed = lifecycle.renew().await;

    if renewed {
        info!("Vault token renewed successfully");
    } else {
        warn!("Failed to renew Vault token");
    }

    TickOutcome { ttl, renewed }
}
