//! In-memory storage module
//!
//! Provides the entry type, its liveness rule, and the sharded map holding
//! entries. This module is independent of clocks and of the sweeper.

mod entry;
mod memory;
mod router;

pub use entry::{CacheEntry, Expiry};
pub use memory::{ShardedStore, StoreStats};
