//! Key/value stores for serialized rate lookups.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Store contract used by the rate service.
///
/// Values are opaque strings; entries are expected to vanish after `ttl`.
pub trait RateCache: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

    fn put<'a>(
        &'a self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    /// `None` when the lifetime runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Process-local store with per-entry expiry.
///
/// Expired entries are dropped when read and swept on every store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<tokio::sync::RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_live(Instant::now()) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value`; a zero `ttl` stores nothing.
    pub async fn store(&self, key: String, value: String, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let now = Instant::now();
        let expires_at = now.checked_add(ttl);
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(key, CacheEntry { value, expires_at });
    }

    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.entries.write().await.retain(|_, entry| entry.is_live(now));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included until read or swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl RateCache for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(self.lookup(key))
    }

    fn put<'a>(
        &'a self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.store(key, value, ttl))
    }
}
