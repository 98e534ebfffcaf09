//! Cache configuration

use serde::Deserialize;
use std::time::Duration;

/// Upper bound on the automatic shard count
const MAX_AUTO_SHARDS: usize = 16;

/// Cache configuration
///
/// Every field has a default, so a host can deserialize a partial document
/// (or none at all) from whatever format it already uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between sweeper runs. 0 disables the sweeper.
    pub auto_release_period_secs: u64,

    /// TTL used by [`Cache::set`](crate::Cache::set), in milliseconds. 0 means forever.
    pub default_ttl_millis: u64,

    /// Number of shards. 0 picks one per CPU core, capped at 16.
    pub shards: usize,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the sweeper every `secs` seconds (0 disables it)
    pub fn with_auto_release_period_secs(mut self, secs: u64) -> Self {
        self.auto_release_period_secs = secs;
        self
    }

    /// TTL applied when the caller does not give one. `Duration::ZERO` means forever.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Sweeper period, if sweeping is enabled
    pub fn auto_release_period(&self) -> Option<Duration> {
        (self.auto_release_period_secs > 0)
            .then(|| Duration::from_secs(self.auto_release_period_secs))
    }

    /// Shard count to actually use
    pub fn effective_shards(&self) -> usize {
        if self.shards > 0 {
            self.shards
        } else {
            num_cpus::get().clamp(1, MAX_AUTO_SHARDS)
        }
    }
}
