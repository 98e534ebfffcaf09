//! Sharded in-memory storage
//!
//! The key space is split across several shards, each a SipHash-keyed map
//! behind its own `RwLock`. Every per-key operation touches exactly one shard
//! under one lock acquisition, which makes it atomic with respect to other
//! operations on the same key. Whole-store operations visit the shards one
//! after the other and never hold more than one lock at a time.

use super::entry::{CacheEntry, Expiry};
use super::router::ShardRouter;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Type alias for a shard's map with SipHasher
type ShardMap<T> = HashMap<String, CacheEntry<T>, BuildHasherDefault<SipHasher13>>;

/// Concurrent map from key to [`CacheEntry`]
///
/// Knows nothing about clocks: callers pass the `now` reading that liveness
/// is judged against.
#[derive(Debug)]
pub struct ShardedStore<T> {
    shards: Vec<RwLock<ShardMap<T>>>,
    router: ShardRouter,
}

impl<T> ShardedStore<T> {
    /// Create a store with `num_shards` shards (at least one)
    pub fn new(num_shards: usize) -> Self {
        let router = ShardRouter::new(num_shards);
        let shards = (0..router.num_shards())
            .map(|_| RwLock::new(ShardMap::default()))
            .collect();

        ShardedStore { shards, router }
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    // Entries are immutable once inserted, so a writer that panicked cannot
    // have left a half-built one behind: poisoned locks are safe to reuse.
    fn read_shard(&self, index: usize) -> RwLockReadGuard<'_, ShardMap<T>> {
        self.shards[index]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_shard(&self, index: usize) -> RwLockWriteGuard<'_, ShardMap<T>> {
        self.shards[index]
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn shard_for(&self, key: &str) -> usize {
        self.router.route_key(key)
    }

    /// Insert or replace the entry for `key`
    pub fn insert(&self, key: String, entry: CacheEntry<T>) {
        let index = self.shard_for(&key);
        self.write_shard(index).insert(key, entry);
    }

    /// Remaining lifetime of the live entry for `key`
    pub fn expiry(&self, key: &str, now: u64) -> Option<Expiry> {
        self.read_shard(self.shard_for(key))
            .get(key)
            .and_then(|entry| entry.expiry(now))
    }

    /// Whether a live entry exists for `key`
    pub fn contains_alive(&self, key: &str, now: u64) -> bool {
        self.read_shard(self.shard_for(key))
            .get(key)
            .is_some_and(|entry| entry.is_alive(now))
    }

    /// Delete the entry for `key`, live or dead. Returns true if one existed.
    pub fn remove(&self, key: &str) -> bool {
        let index = self.shard_for(key);
        self.write_shard(index).remove(key).is_some()
    }

    /// Delete every entry. Returns how many were stored, live or dead.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for index in 0..self.shards.len() {
            let mut shard = self.write_shard(index);
            removed += shard.len();
            shard.clear();
        }
        removed
    }

    /// Number of stored entries, dead ones included
    pub fn raw_len(&self) -> usize {
        (0..self.shards.len())
            .map(|index| self.read_shard(index).len())
            .sum()
    }

    /// Number of entries alive at `now`
    pub fn count_alive(&self, now: u64) -> usize {
        (0..self.shards.len())
            .map(|index| {
                self.read_shard(index)
                    .values()
                    .filter(|entry| entry.is_alive(now))
                    .count()
            })
            .sum()
    }

    /// Whether at least one entry is alive at `now`
    pub fn any_alive(&self, now: u64) -> bool {
        (0..self.shards.len()).any(|index| {
            self.read_shard(index)
                .values()
                .any(|entry| entry.is_alive(now))
        })
    }

    /// Keys of entries alive at `now` that satisfy `filter`, in no particular order
    pub fn alive_keys<F>(&self, now: u64, filter: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut keys = Vec::new();
        for index in 0..self.shards.len() {
            let shard = self.read_shard(index);
            keys.extend(
                shard
                    .iter()
                    .filter(|(key, entry)| entry.is_alive(now) && filter(key.as_str()))
                    .map(|(key, _)| key.clone()),
            );
        }
        keys
    }

    /// Remove every entry dead at `now` (proactive expiration)
    ///
    /// Returns the number of entries removed. Entries inserted into a shard
    /// after it has been visited are left for the next pass.
    pub fn remove_dead(&self, now: u64) -> usize {
        let mut removed = 0;
        for index in 0..self.shards.len() {
            let mut shard = self.write_shard(index);
            let before = shard.len();
            shard.retain(|_, entry| entry.is_alive(now));
            removed += before - shard.len();
        }
        removed
    }

    /// Collect statistics, judging every entry against the same `now`
    pub fn stats(&self, now: u64) -> StoreStats {
        let mut total_keys = 0;
        let mut live_keys = 0;

        for index in 0..self.shards.len() {
            let shard = self.read_shard(index);
            total_keys += shard.len();
            live_keys += shard.values().filter(|entry| entry.is_alive(now)).count();
        }

        StoreStats {
            total_keys,
            live_keys,
            expired_keys: total_keys - live_keys,
        }
    }
}

impl<T: Clone> ShardedStore<T> {
    /// Clone of the value for `key` if its entry is alive at `now`
    pub fn get(&self, key: &str, now: u64) -> Option<T> {
        self.read_shard(self.shard_for(key))
            .get(key)
            .filter(|entry| entry.is_alive(now))
            .map(|entry| entry.value().clone())
    }

    /// Like [`get`](Self::get), but removes the entry if it is dead
    pub fn get_and_purge_if_dead(&self, key: &str, now: u64) -> Option<T> {
        let index = self.shard_for(key);

        // Fast path: live entries and missing keys only need a read lock
        {
            let shard = self.read_shard(index);
            match shard.get(key) {
                None => return None,
                Some(entry) if entry.is_alive(now) => return Some(entry.value().clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: another thread may have replaced
        // the dead entry with a live one in between
        let mut shard = self.write_shard(index);
        match shard.get(key) {
            Some(entry) if entry.is_alive(now) => return Some(entry.value().clone()),
            Some(_) => {}
            None => return None,
        }

        shard.remove(key);
        None
    }
}

/// Statistics about the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Stored entries, live or dead
    pub total_keys: usize,
    pub live_keys: usize,
    /// Dead entries still occupying memory
    pub expired_keys: usize,
}
