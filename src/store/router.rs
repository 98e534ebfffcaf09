//! Key routing logic for sharding
//!
//! Routes keys to shards using SipHash.

use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

/// Routes keys to shards by hash
#[derive(Debug, Clone, Copy)]
pub struct ShardRouter {
    num_shards: usize,
}

impl ShardRouter {
    /// Create a new shard router. `num_shards` is raised to 1 if zero.
    pub fn new(num_shards: usize) -> Self {
        ShardRouter {
            num_shards: num_shards.max(1),
        }
    }

    /// Route a key to a shard index
    pub fn route_key(&self, key: &str) -> usize {
        (Self::hash_key(key) % self.num_shards as u64) as usize
    }

    fn hash_key(key: &str) -> u64 {
        let mut hasher = SipHasher13::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_deterministic() {
        let router = ShardRouter::new(4);
        assert_eq!(router.route_key("session:42"), router.route_key("session:42"));
    }

    #[test]
    fn test_routing_distribution() {
        let router = ShardRouter::new(4);
        let mut shard_counts = [0usize; 4];

        for i in 0..1000 {
            shard_counts[router.route_key(&format!("key_{}", i))] += 1;
        }

        // Roughly 250 keys per shard
        for count in shard_counts {
            assert!(count > 150 && count < 350, "Uneven distribution: {}", count);
        }
    }

    #[test]
    fn test_zero_shards_means_one() {
        let router = ShardRouter::new(0);
        assert_eq!(router.num_shards(), 1);
        assert_eq!(router.route_key("anything"), 0);
    }
}
