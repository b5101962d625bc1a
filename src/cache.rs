// src/cache.rs
//! # Analysis Cache
//! Bounded in-memory memo table keyed by a content hash of
//! (corpus snapshot fingerprint, parameters).
//!
//! Every entry remembers the snapshot it was derived from, so a caller that replaces
//! its corpus can drop everything derived from the old one with
//! `invalidate_snapshot`. Eviction is oldest-first once `capacity` is reached.
//!
//! Values are handed out as `Arc<V>`; the lock is never held while a value is being
//! computed.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Content-derived cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    snapshot: String,
    digest: String,
}

impl CacheKey {
    /// `snapshot` is a corpus fingerprint; `parts` are artist ids, parameters, etc.
    pub fn new(snapshot: &str, parts: &[&str]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(snapshot.as_bytes());
        for p in parts {
            hasher.update([0x1f]);
            hasher.update(p.as_bytes());
        }
        Self {
            snapshot: snapshot.to_string(),
            digest: crate::corpus::to_hex(&hasher.finalize()),
        }
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

#[derive(Debug)]
struct Entry<V> {
    snapshot: String,
    value: Arc<V>,
}

#[derive(Debug)]
struct Inner<V> {
    map: HashMap<String, Entry<V>>,
    /// Insertion order of digests, oldest first.
    order: VecDeque<String>,
}

#[derive(Debug)]
pub struct AnalysisCache<V> {
    name: &'static str,
    inner: Mutex<Inner<V>>,
    capacity: usize,
}

impl<V> AnalysisCache<V> {
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            inner: Mutex::new(Inner {
                map: HashMap::with_capacity(capacity.min(1024)),
                order: VecDeque::with_capacity(capacity.min(1024)),
            }),
            capacity,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let inner = self.inner.lock().expect("analysis cache mutex poisoned");
        inner.map.get(key.digest()).map(|e| Arc::clone(&e.value))
    }

    /// Insert (or replace) a value and return the shared handle.
    pub fn insert(&self, key: &CacheKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut inner = self.inner.lock().expect("analysis cache mutex poisoned");
        let digest = key.digest().to_string();
        if inner.map.contains_key(&digest) {
            inner.order.retain(|d| d != &digest);
        }
        inner.map.insert(
            digest.clone(),
            Entry {
                snapshot: key.snapshot().to_string(),
                value: Arc::clone(&value),
            },
        );
        inner.order.push_back(digest);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
        value
    }

    /// Memoized computation: `compute` runs only on a miss.
    pub fn get_or_insert_with<F>(&self, key: &CacheKey, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(hit) = self.get(key) {
            metrics::counter!("lyrics_cache_hits_total", "cache" => self.name).increment(1);
            debug!(target: "cache", cache = self.name, key = &key.digest()[..12], "hit");
            return hit;
        }
        metrics::counter!("lyrics_cache_misses_total", "cache" => self.name).increment(1);
        debug!(target: "cache", cache = self.name, key = &key.digest()[..12], "miss");
        self.insert(key, compute())
    }

    /// Drop every entry derived from `snapshot`. Returns how many were removed.
    pub fn invalidate_snapshot(&self, snapshot: &str) -> usize {
        let mut inner = self.inner.lock().expect("analysis cache mutex poisoned");
        let stale: Vec<String> = inner
            .map
            .iter()
            .filter(|(_, e)| e.snapshot == snapshot)
            .map(|(d, _)| d.clone())
            .collect();
        for d in &stale {
            inner.map.remove(d);
        }
        inner.order.retain(|d| !stale.contains(d));
        if !stale.is_empty() {
            debug!(target: "cache", cache = self.name, removed = stale.len(), "invalidated snapshot");
        }
        stale.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("analysis cache mutex poisoned");
        inner.map.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("analysis cache mutex poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn computes_once_per_key() {
        let cache: AnalysisCache<u32> = AnalysisCache::with_capacity("test", 4);
        let calls = Cell::new(0);
        let key = CacheKey::new("snap", &["queen", "k=5"]);
        for _ in 0..3 {
            let v = cache.get_or_insert_with(&key, || {
                calls.set(calls.get() + 1);
                7
            });
            assert_eq!(*v, 7);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn key_depends_on_every_part() {
        let a = CacheKey::new("snap", &["queen", "kiss"]);
        let b = CacheKey::new("snap", &["queenkiss"]);
        let c = CacheKey::new("snap2", &["queen", "kiss"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn evicts_oldest_first() {
        let cache: AnalysisCache<u32> = AnalysisCache::with_capacity("test", 2);
        let k1 = CacheKey::new("s", &["1"]);
        let k2 = CacheKey::new("s", &["2"]);
        let k3 = CacheKey::new("s", &["3"]);
        cache.insert(&k1, 1);
        cache.insert(&k2, 2);
        cache.insert(&k3, 3);
        assert!(cache.get(&k1).is_none());
        assert_eq!(cache.get(&k3).map(|v| *v), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidates_by_snapshot() {
        let cache: AnalysisCache<u32> = AnalysisCache::with_capacity("test", 8);
        cache.insert(&CacheKey::new("old", &["a"]), 1);
        cache.insert(&CacheKey::new("old", &["b"]), 2);
        cache.insert(&CacheKey::new("new", &["a"]), 3);
        assert_eq!(cache.invalidate_snapshot("old"), 2);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
