//! Entry structure for cached values

use std::time::Duration;

/// Remaining lifetime of a live entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Stored with a TTL of zero
    Never,
    /// Dies once this much more time has passed
    In(Duration),
}

/// A single cached value with its creation stamp and TTL
///
/// Entries are never modified after construction. Overwriting a key stores a
/// new entry in place of the old one.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,

    /// Clock reading (ms) at insertion
    created_at: u64,

    /// 0 means the entry never expires
    ttl_millis: u64,
}

impl<T> CacheEntry<T> {
    /// Create a new entry stamped at `created_at`
    pub fn new(value: T, created_at: u64, ttl_millis: u64) -> Self {
        CacheEntry {
            value,
            created_at,
            ttl_millis,
        }
    }

    /// The cached payload
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Liveness at `now`
    ///
    /// An entry sitting exactly on its expiry boundary is dead.
    pub fn is_alive(&self, now: u64) -> bool {
        self.ttl_millis == 0 || self.created_at.saturating_add(self.ttl_millis) > now
    }

    /// Remaining lifetime at `now`, or `None` if the entry is dead
    pub fn expiry(&self, now: u64) -> Option<Expiry> {
        if self.ttl_millis == 0 {
            return Some(Expiry::Never);
        }

        let deadline = self.created_at.saturating_add(self.ttl_millis);
        if deadline > now {
            Some(Expiry::In(Duration::from_millis(deadline - now)))
        } else {
            None
        }
    }
}
