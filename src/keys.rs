//! Key filtering helpers
//!
//! Supported patterns:
//! - `*` : matches every key
//! - `prefix*` : keys starting with prefix
//! - `*suffix` : keys ending with suffix
//! - `*infix*` : keys containing infix
//! - anything else : exact match

/// A parsed key pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    Any,
    Prefix(String),
    Suffix(String),
    Contains(String),
    Exact(String),
}

impl KeyPattern {
    /// Parse a pattern string
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return KeyPattern::Any;
        }

        match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
            (Some(rest), Some(_)) => {
                let inner = rest.strip_suffix('*').unwrap_or(rest);
                KeyPattern::Contains(inner.to_string())
            }
            (Some(suffix), None) => KeyPattern::Suffix(suffix.to_string()),
            (None, Some(prefix)) => KeyPattern::Prefix(prefix.to_string()),
            (None, None) => KeyPattern::Exact(pattern.to_string()),
        }
    }

    /// Check if a key matches this pattern
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Any => true,
            KeyPattern::Prefix(prefix) => key.starts_with(prefix.as_str()),
            KeyPattern::Suffix(suffix) => key.ends_with(suffix.as_str()),
            KeyPattern::Contains(inner) => key.contains(inner.as_str()),
            KeyPattern::Exact(exact) => key == exact.as_str(),
        }
    }
}
