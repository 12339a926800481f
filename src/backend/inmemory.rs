//! In-memory cache backend (thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding. Expired entries
//! are treated as absent and evicted lazily on access.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    /// A TTL too large to represent as an instant stores without expiry.
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same store, so a test can keep one handle to inspect
/// what the entity store wrote through another.
///
/// # Example
///
/// ```no_run
/// use user_store::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("1", b"{}".to_vec(), Some(Duration::from_secs(300))).await?;
///     assert!(backend.get("1").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remaining time-to-live of a live entry.
    ///
    /// `None` when the key is absent, expired, or stored without expiry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entry = self.store.get(key)?;
        if entry.is_expired() {
            return None;
        }
        entry
            .expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Evict if present but expired
        self.store.remove_if(key, |_, entry| entry.is_expired());
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.store
            .insert(key.to_string(), CacheEntry::new(value, ttl));

        match ttl {
            Some(d) => debug!("✓ InMemory SET {} (TTL: {:?})", key, d),
            None => debug!("✓ InMemory SET {}", key),
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .store
            .get(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

}
