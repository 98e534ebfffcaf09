//! ttlcache - A thread-safe, time-expiring key-value cache
//!
//! Values are stored under string keys, each with its own TTL:
//! - Expired entries read as absent without any eviction pass (lazy expiration)
//! - An optional per-cache sweeper thread reclaims them in the background (eager expiration)
//! - Both judge liveness with the same rule against the same clock

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod store;
pub mod sweeper;

/// Re-export commonly used types
pub use cache::Cache;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::CacheConfig;
pub use error::CacheError;
pub use keys::KeyPattern;
pub use store::{CacheEntry, Expiry, StoreStats};
pub use sweeper::SweeperState;
