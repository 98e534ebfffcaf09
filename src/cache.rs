//! The public cache type
//!
//! [`Cache`] ties a [`ShardedStore`] to a [`Clock`] and, when auto-release is
//! configured, to its own [`Sweeper`]. Reads apply the liveness rule lazily;
//! the sweeper applies it eagerly. Both read the same clock.

use crate::clock::{Clock, MonotonicClock};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::keys::KeyPattern;
use crate::store::{CacheEntry, Expiry, ShardedStore, StoreStats};
use crate::sweeper::{Sweeper, SweeperState};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Thread-safe key-value cache with per-entry TTL
///
/// Share it between threads with an `Arc`; no external locking is needed.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use ttlcache::{Cache, CacheConfig};
///
/// let config = CacheConfig::new()
///     .with_auto_release_period_secs(60)
///     .with_default_ttl(Duration::from_secs(300));
/// let cache: Cache<String> = Cache::new(config)?;
///
/// cache.set("user:42", "Alice".to_string());
/// cache.set_with_ttl("otp:42", "123456".to_string(), Duration::from_secs(30));
/// assert_eq!(cache.get("user:42").as_deref(), Some("Alice"));
///
/// cache.shutdown();
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Cache<T> {
    store: Arc<ShardedStore<T>>,
    clock: Arc<dyn Clock>,
    default_ttl_millis: u64,
    sweeper: Mutex<Option<Sweeper>>,
    sweeper_enabled: bool,
}

impl<T> Cache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache on the monotonic clock
    ///
    /// Starts a sweeper thread if `config` asks for auto-release.
    pub fn new(config: CacheConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Create a cache reading time from `clock`
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Arc::new(ShardedStore::new(config.effective_shards()));

        let sweeper = match config.auto_release_period() {
            Some(period) => Some(Sweeper::spawn(store.clone(), clock.clone(), period)?),
            None => None,
        };

        let sweep_every = match &sweeper {
            Some(sweeper) => format!("every {:?}", sweeper.period()),
            None => "disabled".to_string(),
        };
        info!(
            "Cache initialized with {} shards, default TTL {} ms, sweeper {}",
            store.num_shards(),
            config.default_ttl_millis,
            sweep_every
        );

        Ok(Cache {
            store,
            clock,
            default_ttl_millis: config.default_ttl_millis,
            sweeper_enabled: sweeper.is_some(),
            sweeper: Mutex::new(sweeper),
        })
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    fn insert(&self, key: String, value: T, ttl_millis: u64) {
        let entry = CacheEntry::new(value, self.now(), ttl_millis);
        self.store.insert(key, entry);
    }

    /// Store `value` under `key` with the default TTL
    pub fn set(&self, key: impl Into<String>, value: T) {
        self.insert(key.into(), value, self.default_ttl_millis);
    }

    /// Store `value` under `key` for `ttl`. `Duration::ZERO` means forever.
    ///
    /// Replaces any previous entry, live or dead; the new entry's clock starts now.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.insert(key.into(), value, ttl_millis);
    }

    /// Store `value` under `key` for `ttl_millis` milliseconds (0 = forever)
    ///
    /// A negative TTL is dropped silently: nothing is written and any previous
    /// entry for `key` is left untouched. Use [`try_set_millis`](Self::try_set_millis)
    /// to be told about it.
    pub fn set_millis(&self, key: impl Into<String>, value: T, ttl_millis: i64) {
        if let Err(e) = self.try_set_millis(key, value, ttl_millis) {
            debug!("Dropped write: {}", e);
        }
    }

    /// Like [`set_millis`](Self::set_millis), but reports a negative TTL
    pub fn try_set_millis(
        &self,
        key: impl Into<String>,
        value: T,
        ttl_millis: i64,
    ) -> Result<(), CacheError> {
        let ttl = u64::try_from(ttl_millis).map_err(|_| CacheError::NegativeTtl(ttl_millis))?;
        self.insert(key.into(), value, ttl);
        Ok(())
    }

    /// The value for `key` if it is alive right now
    ///
    /// Dead entries are reported absent but left in storage.
    pub fn get(&self, key: &str) -> Option<T> {
        self.store.get(key, self.now())
    }

    /// Like [`get`](Self::get), but also removes the entry if it is dead
    pub fn get_and_purge_if_dead(&self, key: &str) -> Option<T> {
        self.store.get_and_purge_if_dead(key, self.now())
    }

    pub fn get_or_default(&self, key: &str, fallback: T) -> T {
        self.get(key).unwrap_or(fallback)
    }

    /// True iff [`get`](Self::get) would return a value
    pub fn contains(&self, key: &str) -> bool {
        self.store.contains_alive(key, self.now())
    }

    /// Remaining lifetime of the entry for `key`, or `None` if absent or dead
    pub fn time_to_live(&self, key: &str) -> Option<Expiry> {
        self.store.expiry(key, self.now())
    }

    /// Delete the entry for `key`, live or dead
    ///
    /// Returns true if an entry was stored under `key`.
    pub fn remove(&self, key: &str) -> bool {
        self.store.remove(key)
    }

    /// Delete every entry, live or dead
    pub fn clear(&self) {
        let removed = self.store.clear();
        debug!(removed = removed, "Cache cleared");
    }

    /// Number of entries alive right now
    ///
    /// Evaluated entry by entry, so the cost grows with dead entries not yet swept.
    pub fn size(&self) -> usize {
        self.store.count_alive(self.now())
    }

    pub fn is_empty(&self) -> bool {
        !self.store.any_alive(self.now())
    }

    /// Keys of entries alive right now, in no particular order
    pub fn key_set(&self) -> Vec<String> {
        self.store.alive_keys(self.now(), |_| true)
    }

    /// Live keys matching a pattern (`*`, `prefix*`, `*suffix`, `*infix*` or exact)
    pub fn keys_matching(&self, pattern: &str) -> Vec<String> {
        let pattern = KeyPattern::parse(pattern);
        self.store.alive_keys(self.now(), |key| pattern.matches(key))
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.store.alive_keys(self.now(), |key| key.starts_with(prefix))
    }

    /// Number of stored entries, dead ones included
    pub fn raw_len(&self) -> usize {
        self.store.raw_len()
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats(self.now())
    }

    /// Run one sweep pass on the calling thread
    ///
    /// Returns the number of dead entries removed.
    pub fn purge_expired(&self) -> usize {
        self.store.remove_dead(self.now())
    }

    /// TTL used by [`set`](Self::set). `Duration::ZERO` means forever.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_millis)
    }

    pub fn sweeper_state(&self) -> SweeperState {
        if !self.sweeper_enabled {
            return SweeperState::Disabled;
        }

        match self.lock_sweeper().as_ref() {
            Some(sweeper) if sweeper.is_running() => SweeperState::Running,
            _ => SweeperState::Stopped,
        }
    }

    fn lock_sweeper(&self) -> std::sync::MutexGuard<'_, Option<Sweeper>> {
        self.sweeper.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear every entry and stop the sweeper
    ///
    /// Safe to call more than once, and when no sweeper was ever started.
    /// The cache stays usable afterwards but never sweeps again.
    pub fn shutdown(&self) {
        self.clear();

        // Take the sweeper out before joining so the lock is not held meanwhile
        let sweeper = self.lock_sweeper().take();
        if let Some(mut sweeper) = sweeper {
            sweeper.stop();
        }
        info!("Cache shut down");
    }
}
