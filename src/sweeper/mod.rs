//! Background expiration sweeper
//!
//! Each cache that asks for auto-release owns one sweeper: a dedicated thread
//! running a single-threaded tokio runtime, ticking on a fixed-rate interval.
//! Every tick removes the entries that are dead at that moment, using the same
//! liveness rule readers use, so a sweep can never remove a live entry.

use crate::clock::Clock;
use crate::store::ShardedStore;
use anyhow::Context;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const SWEEPER_THREAD_NAME: &str = "ttlcache-sweeper";

/// Lifecycle of a cache's sweeper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    /// No auto-release period was configured; no sweeper exists
    Disabled,
    Running,
    /// Stopped by shutdown. Terminal.
    Stopped,
}

/// Handle to a running sweeper thread
///
/// Dropping the handle stops the thread and waits for it.
#[derive(Debug)]
pub struct Sweeper {
    period: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Start sweeping `store` every `period`, first run one period from now
    pub fn spawn<T>(
        store: Arc<ShardedStore<T>>,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> anyhow::Result<Self>
    where
        T: Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("Failed to create sweeper runtime")?;

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = std::thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(Self::run_sweep_loop(store, clock, period, task_cancel));
            })
            .context("Failed to spawn sweeper thread")?;

        info!("Sweeper started, period: {:?}", period);

        Ok(Sweeper {
            period,
            cancel,
            handle: Some(handle),
        })
    }

    /// The loop that runs on the sweeper thread
    async fn run_sweep_loop<T>(
        store: Arc<ShardedStore<T>>,
        clock: Arc<dyn Clock>,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = ticker.tick() => {
                    let removed = store.remove_dead(clock.now_millis());
                    if removed > 0 {
                        debug!(removed = removed, "Swept expired entries");
                    }
                }
            }
        }

        debug!("Sweeper loop exiting");
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the schedule and wait for the thread
    ///
    /// A pass already in progress finishes first. Calling this again is a no-op.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.cancel.cancel();
        if handle.join().is_err() {
            error!("Sweeper thread panicked");
        } else {
            info!("Sweeper stopped");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, MonotonicClock};
    use crate::store::CacheEntry;
    use std::thread::sleep;

    #[test]
    fn test_sweeper_removes_dead_entries_without_reads() {
        let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
        let store = Arc::new(ShardedStore::new(2));
        store.insert("short".to_string(), CacheEntry::new(1, clock.now_millis(), 10));
        store.insert("forever".to_string(), CacheEntry::new(2, clock.now_millis(), 0));

        let mut sweeper =
            Sweeper::spawn(store.clone(), clock, Duration::from_millis(50)).unwrap();
        sleep(Duration::from_millis(200));

        assert_eq!(store.raw_len(), 1);
        sweeper.stop();
    }

    #[test]
    fn test_first_run_waits_one_period() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(ShardedStore::new(1));
        store.insert("k".to_string(), CacheEntry::new("v", 0, 10));
        clock.advance(Duration::from_millis(100));

        let _sweeper =
            Sweeper::spawn(store.clone(), clock.clone(), Duration::from_secs(5)).unwrap();
        sleep(Duration::from_millis(100));

        // Dead, but the first tick is still seconds away
        assert_eq!(store.raw_len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let store: Arc<ShardedStore<u8>> = Arc::new(ShardedStore::new(1));
        let mut sweeper = Sweeper::spawn(
            store,
            Arc::new(MonotonicClock::new()),
            Duration::from_millis(20),
        )
        .unwrap();

        assert!(sweeper.is_running());
        assert_eq!(sweeper.period(), Duration::from_millis(20));
        sweeper.stop();
        sweeper.stop();
        assert!(!sweeper.is_running());
    }

    #[test]
    fn test_stopped_sweeper_no_longer_runs() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(ShardedStore::new(1));
        let mut sweeper =
            Sweeper::spawn(store.clone(), clock.clone(), Duration::from_millis(20)).unwrap();
        sweeper.stop();

        store.insert("k".to_string(), CacheEntry::new("v", 0, 10));
        clock.advance(Duration::from_millis(100));
        sleep(Duration::from_millis(100));

        assert_eq!(store.raw_len(), 1);
    }
}
