//! Cache errors

use std::fmt;

/// Errors reported by the validating cache operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A write was given a TTL below zero (milliseconds)
    NegativeTtl(i64),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NegativeTtl(ttl) => write!(f, "Negative TTL: {} ms", ttl),
        }
    }
}

impl std::error::Error for CacheError {}
