//! Catalog Configuration

use std::time::Duration;

use platform::cache::DEFAULT_TTL;

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Lifetime of a cached lookup
    pub cache_ttl: Duration,
    /// Upper bound on cached entries per cache
    pub cache_capacity: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            cache_capacity: 1_000,
        }
    }
}

impl CatalogConfig {
    /// Short TTL so manual database edits show up quickly.
    pub fn development() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            ..Default::default()
        }
    }
}
