//! Result cache configuration.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;

/// Result cache configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Lifetime of positive and negative review results.
    #[serde(deserialize_with = "deserialize_duration")]
    pub ttl: Duration,
    /// Period of the background sweep removing expired entries.
    #[serde(deserialize_with = "deserialize_duration")]
    pub eviction_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(2 * 60),
            eviction_interval: Duration::from_secs(30),
        }
    }
}
