use dashmap::DashMap;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// TTL cache for computed responses, keyed by request fingerprint
pub struct ResponseCache<V> {
    entries: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
    stats: Arc<RwLock<CacheStats>>,
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Hex SHA-256 of an arbitrary key, so cache keys have a bounded size
pub fn fingerprint(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let fresh = match self.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.stats.write().misses += 1;
                return None;
            }
        };

        match fresh {
            Some(value) => {
                self.stats.write().hits += 1;
                Some(value)
            }
            None => {
                self.entries.remove(key);
                self.stats.write().misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        if self.entries.len() >= self.max_entries {
            self.evict();
        }
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Drop expired entries; if still full, drop the oldest one
    fn evict(&self) {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.created_at.elapsed() <= ttl);

        if self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }

        let evicted = before.saturating_sub(self.entries.len()) as u64;
        if evicted > 0 {
            self.stats.write().evictions += evicted;
            tracing::debug!(evicted, "Response cache evicted entries");
        }
    }
}
