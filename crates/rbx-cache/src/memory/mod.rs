//! In-memory response cache with TTL support

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use rbx_config::CacheSettings;

use crate::adapter::{CacheAdapter, CachedResponse};
use crate::CacheResult;

/// Cache entry with optional TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached response
    pub value: CachedResponse,
    /// When the entry was stored
    pub stored_at: Instant,
    /// Time-to-live duration; `None` keeps the entry until cleared
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    /// Create cache entry with an optional TTL
    pub fn new(value: CachedResponse, ttl: Option<Duration>) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.stored_at.elapsed() < ttl,
            None => true,
        }
    }

    /// Get age of cache entry
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

/// In-memory response cache with lazy expiry
#[derive(Debug)]
pub struct MemoryCache {
    /// Adapter name used by cache rules
    name: String,
    /// Cache storage
    cache: DashMap<String, CacheEntry>,
    /// TTL applied when the settings carry no lifetime
    default_ttl: Option<Duration>,
}

impl MemoryCache {
    /// Create new memory cache registered as `"memory"`
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create a memory cache registered under a custom name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cache: DashMap::new(),
            default_ttl: None,
        }
    }

    /// Set the TTL used for entries whose settings carry no lifetime
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }
}

impl MemoryCache {
    /// Get cached response if fresh
    pub fn get_fresh(&self, key: &str) -> Option<CachedResponse> {
        {
            let entry = self.cache.get(key)?;
            if entry.is_fresh() {
                return Some(entry.value.clone());
            }
        }

        // The read guard is gone; only drop the entry if it is still stale
        // so a concurrent fresh insert survives.
        self.cache.remove_if(key, |_, entry| !entry.is_fresh());
        None
    }

    /// Store a response with an explicit TTL
    pub fn insert_with_ttl(&self, key: String, value: CachedResponse, ttl: Option<Duration>) {
        self.cache.insert(key, CacheEntry::new(value, ttl));
    }

    /// Check if key is cached and fresh
    pub fn contains_fresh(&self, key: &str) -> bool {
        self.cache.get(key)
            .map(|entry| entry.is_fresh())
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut fresh_count = 0;
        let mut stale_count = 0;

        for entry in self.cache.iter() {
            if entry.is_fresh() {
                fresh_count += 1;
            } else {
                stale_count += 1;
            }
        }

        CacheStats {
            total_entries: fresh_count + stale_count,
            fresh_entries: fresh_count,
            stale_entries: stale_count,
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove stale entries
    pub fn cleanup(&self) -> usize {
        let mut removed = 0;
        self.cache.retain(|_, entry| {
            if entry.is_fresh() {
                true
            } else {
                removed += 1;
                false
            }
        });
        removed
    }
}

#[async_trait]
impl CacheAdapter for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        Ok(self.get_fresh(key))
    }

    async fn set(&self, settings: &CacheSettings, key: &str, value: CachedResponse) -> CacheResult<()> {
        let ttl = settings.lifetime().or(self.default_ttl);
        self.insert_with_ttl(key.to_string(), value, ttl);
        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries
    pub stale_entries: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}
