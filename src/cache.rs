// Response cache with per-entry expiry

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A stored value plus the moment it was written and how long it stays fresh
#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CachedEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Thread-safe in-memory TTL cache
///
/// Expiry is lazy: stale entries stay in the map until overwritten, but `get`
/// never returns them. There is no size bound.
pub struct TimedCache<V = Value> {
    entries: Arc<DashMap<String, CachedEntry<V>>>,
}

impl<V: Clone> TimedCache<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Get a fresh value, or `None` if the key is unknown or expired
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(Instant::now()) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Store a value for `ttl_minutes`, replacing any previous entry.
    ///
    /// A zero TTL is rejected and nothing is stored.
    pub fn set(&self, key: impl Into<String>, value: V, ttl_minutes: u64) {
        let key = key.into();
        if ttl_minutes == 0 {
            tracing::warn!("Refusing to cache '{}' with a zero TTL", key);
            return;
        }
        let ttl = Duration::from_secs(ttl_minutes.saturating_mul(60));
        self.set_with_ttl(key, value, ttl);
    }

    /// Store a value with an explicit TTL
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CachedEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    /// Drop a single entry
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TimedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for TimedCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}
