//! Scheduler timing, ordering and cancellation, driven on paused time.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vault_session::{Scheduler, TokenLifecycle, TtlStatus};

const INTERVAL: Duration = Duration::from_secs(60);

#[derive(Default)]
struct RecordingLifecycle {
    calls: Mutex<Vec<&'static str>>,
    lookups: AtomicU32,
    renew_ok: bool,
    panic_on_first_lookup: bool,
    lookup_delay: Option<Duration>,
}

impl RecordingLifecycle {
    fn succeeding() -> Self {
        Self {
            renew_ok: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenLifecycle for RecordingLifecycle {
    async fn lookup(&self) -> TtlStatus {
        let n = self.lookups.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push("lookup");
        if self.panic_on_first_lookup && n == 0 {
            panic!("lookup exploded");
        }
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        TtlStatus::Remaining(Duration::from_secs(300))
    }

    async fn renew(&self) -> bool {
        self.calls.lock().unwrap().push("renew");
        self.renew_ok
    }
}

fn start(lifecycle: &Arc<RecordingLifecycle>) -> (CancellationToken, tokio::task::JoinHandle<u64>) {
    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(lifecycle.clone(), INTERVAL, cancel.clone());
    (cancel, tokio::spawn(scheduler.run()))
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_wait_exits_without_new_tick() {
    let lifecycle = Arc::new(RecordingLifecycle::succeeding());
    let (cancel, handle) = start(&lifecycle);

    tokio::time::sleep(Duration::from_secs(30)).await;
    cancel.cancel();

    let ticks = handle.await.unwrap();
    assert_eq!(ticks, 1);
    assert_eq!(lifecycle.calls(), vec!["lookup", "renew"]);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_follow_interval_in_order() {
    let lifecycle = Arc::new(RecordingLifecycle::succeeding());
    let (cancel, handle) = start(&lifecycle);

    // Ticks at 0s, 60s and 120s.
    tokio::time::sleep(Duration::from_secs(150)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), 3);
    assert_eq!(
        lifecycle.calls(),
        vec!["lookup", "renew", "lookup", "renew", "lookup", "renew"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_renewals_keep_loop_running() {
    let lifecycle = Arc::new(RecordingLifecycle::default());
    let (cancel, handle) = start(&lifecycle);

    tokio::time::sleep(Duration::from_secs(90)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), 2);
    assert_eq!(lifecycle.calls(), vec!["lookup", "renew", "lookup", "renew"]);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_tick_does_not_stop_scheduler() {
    let lifecycle = Arc::new(RecordingLifecycle {
        renew_ok: true,
        panic_on_first_lookup: true,
        ..RecordingLifecycle::default()
    });
    let (cancel, handle) = start(&lifecycle);

    tokio::time::sleep(Duration::from_secs(90)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), 2);
    // The first tick died inside lookup, so renew only ran on the second.
    assert_eq!(lifecycle.calls(), vec!["lookup", "lookup", "renew"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_tick_lets_tick_finish() {
    let lifecycle = Arc::new(RecordingLifecycle {
        renew_ok: true,
        lookup_delay: Some(Duration::from_secs(10)),
        ..RecordingLifecycle::default()
    });
    let (cancel, handle) = start(&lifecycle);

    tokio::time::sleep(Duration::from_secs(5)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), 1);
    assert_eq!(lifecycle.calls(), vec!["lookup", "renew"]);
}

#[test]
fn test_cancelled_before_start_runs_no_tick() {
    let lifecycle = Arc::new(RecordingLifecycle::succeeding());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let scheduler = Scheduler::new(lifecycle.clone(), INTERVAL, cancel);
    assert_eq!(scheduler.interval(), INTERVAL);

    let ticks = tokio_test::block_on(scheduler.run());
    assert_eq!(ticks, 0);
    assert!(lifecycle.calls().is_empty());
}
