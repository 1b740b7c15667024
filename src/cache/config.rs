//! Cache configuration.
//!
//! Controls the in-process response cache via the `[cache]` table of `menuboard.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_TTL_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve reads from the cache and invalidate on writes.
    pub enabled: bool,
    /// Maximum number of entries before least-recently-used eviction.
    pub capacity: usize,
    /// Expiry applied to every entry.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            ttl_seconds: settings.ttl.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Zero is treated as one second so entries always expire eventually.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.is_enabled());
        assert_eq!(config.capacity, 1024);
        assert_eq!(config.ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            capacity: 0,
            ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
        assert_eq!(config.ttl(), Duration::from_secs(1));
    }
}
