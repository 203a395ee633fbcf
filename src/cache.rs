//! In-memory response cache for AI results.
//!
//! Entries are keyed by a fingerprint of the transcript plus the operation
//! and mode, expire after a fixed TTL, and are evicted least-recently-used
//! when the cache is full. The cache is shared as `Arc<ResponseCache>`; a
//! `Sweeper` task drops expired entries in the background.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FINGERPRINT_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub max_size: usize,
    pub ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    created_at: Instant,
    last_accessed: Instant,
    expires_at: Instant,
    access_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryStats {
    pub key: String,
    pub age_secs: u64,
    pub idle_secs: u64,
    pub access_count: u64,
    pub expires_in_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_secs: u64,
    pub entries: Vec<EntryStats>,
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_size: usize,
    ttl: Duration,
}

/// Short SHA-256 fingerprint of `text`.
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// `{category}:{fingerprint}:{mode}[:{extra}]`
pub fn generate_key(category: &str, text: &str, mode: &str, extra: Option<&str>) -> String {
    let base = format!("{category}:{}:{mode}", fingerprint(text));
    match extra.filter(|e| !e.is_empty()) {
        Some(extra) => format!("{base}:{extra}"),
        None => base,
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl ResponseCache {
    pub fn new(opts: CacheOptions) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size: opts.max_size,
            ttl: opts.ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;

        if entry.is_expired(now) {
            entries.remove(key);
            debug!("Cache expired: {key}");
            return None;
        }

        entry.access_count += 1;
        entry.last_accessed = now;
        debug!("Cache hit: {key}");
        Some(entry.data.clone())
    }

    pub fn set(&self, key: impl Into<String>, data: impl Into<String>) {
        self.set_at(key.into(), data.into(), Instant::now());
    }

    fn set_at(&self, key: String, data: String, now: Instant) {
        if self.max_size == 0 {
            return;
        }

        let mut entries = self.lock();
        if !entries.contains_key(&key) && entries.len() >= self.max_size {
            evict_lru(&mut entries);
        }

        debug!("Cached response: {key}");
        entries.insert(
            key,
            CacheEntry {
                data,
                created_at: now,
                last_accessed: now,
                expires_at: now + self.ttl,
                access_count: 0,
            },
        );
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            info!("Cache cleanup: removed {removed} expired entries");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.lock();
        let mut rows: Vec<EntryStats> = entries
            .iter()
            .map(|(key, e)| EntryStats {
                key: key.clone(),
                age_secs: now.saturating_duration_since(e.created_at).as_secs(),
                idle_secs: now.saturating_duration_since(e.last_accessed).as_secs(),
                access_count: e.access_count,
                expires_in_secs: e.expires_at.saturating_duration_since(now).as_secs(),
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: entries.len(),
            max_size: self.max_size,
            ttl_secs: self.ttl.as_secs(),
            entries: rows,
        }
    }
}

fn evict_lru(entries: &mut HashMap<String, CacheEntry>) {
    let oldest = entries
        .iter()
        .min_by_key(|(_, e)| e.last_accessed)
        .map(|(k, _)| k.clone());
    if let Some(key) = oldest {
        debug!("Cache full, evicting {key}");
        entries.remove(&key);
    }
}

/// Background task that periodically sweeps a shared cache. One task per
/// cache, so sweeps never overlap.
pub struct Sweeper {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Must be called from within a tokio runtime.
    pub fn spawn(cache: Arc<ResponseCache>, every: Duration) -> Self {
        let (tx, mut rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cache.sweep();
                    }
                    _ = &mut rx => break,
                }
            }
            debug!("Cache sweeper stopped");
        });

        Self {
            shutdown: Some(tx),
            handle,
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(max_size: usize, ttl: Duration) -> ResponseCache {
        ResponseCache::new(CacheOptions { max_size, ttl })
    }

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let a = fingerprint("hello");
        assert_eq!(a.len(), 16);
        assert_eq!(a, fingerprint("hello"));
        assert_ne!(a, fingerprint("hello!"));
        // sha256("hello") = 2cf24dba5fb0a30e...
        assert_eq!(a, "2cf24dba5fb0a30e");
    }

    #[test]
    fn test_generate_key() {
        let k1 = generate_key("summarize", "transcript", "tldr", None);
        let k2 = generate_key("summarize", "transcript", "tldr", None);
        assert_eq!(k1, k2);
        assert_eq!(k1, format!("summarize:{}:tldr", fingerprint("transcript")));
        assert_ne!(k1, generate_key("summarize", "other transcript", "tldr", None));
        assert_ne!(k1, generate_key("summarize", "transcript", "eli5", None));

        let q = fingerprint("what?");
        let k3 = generate_key("search", "transcript", "direct", Some(&q));
        assert!(k3.ends_with(&format!(":direct:{q}")));
        assert_eq!(generate_key("x", "t", "m", Some("")), generate_key("x", "t", "m", None));
    }

    #[test]
    fn test_get_miss_and_hit() {
        let cache = ResponseCache::default();
        assert!(cache.get("nope").is_none());
        cache.set("k", "v");
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.stats().entries[0].access_count, 1);
    }

    #[test]
    fn test_lru_evicts_least_recently_accessed() {
        let cache = small(2, Duration::from_secs(60));
        let t0 = Instant::now();
        cache.set_at("a".into(), "1".into(), t0);
        cache.set_at("b".into(), "2".into(), t0 + Duration::from_secs(1));
        // touching "a" makes "b" the least recently accessed
        assert!(cache.get_at("a", t0 + Duration::from_secs(2)).is_some());
        cache.set_at("c".into(), "3".into(), t0 + Duration::from_secs(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get_at("b", t0 + Duration::from_secs(4)).is_none());
        assert!(cache.get_at("a", t0 + Duration::from_secs(4)).is_some());
        assert!(cache.get_at("c", t0 + Duration::from_secs(4)).is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = small(2, Duration::from_secs(60));
        cache.set("a", "1");
        cache.set("b", "2");
        cache.set("a", "3");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").as_deref(), Some("3"));
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_expired_get_removes_entry() {
        let cache = small(10, Duration::from_secs(30));
        let t0 = Instant::now();
        cache.set_at("k".into(), "v".into(), t0);
        assert!(cache.get_at("k", t0 + Duration::from_secs(29)).is_some());
        assert!(cache.get_at("k", t0 + Duration::from_secs(31)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let cache = small(10, Duration::from_secs(30));
        let t0 = Instant::now();
        cache.set_at("old".into(), "v".into(), t0);
        cache.set_at("new".into(), "v".into(), t0 + Duration::from_secs(20));
        assert_eq!(cache.sweep_at(t0 + Duration::from_secs(40)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("new", t0 + Duration::from_secs(40)).is_some());
    }

    #[test]
    fn test_clear_and_stats() {
        let cache = small(5, Duration::from_secs(90));
        cache.set("b", "2");
        cache.set("a", "1");
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 5);
        assert_eq!(stats.ttl_secs, 90);
        assert_eq!(stats.entries[0].key, "a");
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = small(0, Duration::from_secs(60));
        cache.set("k", "v");
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(small(50, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(format!("{t}-{i}"), "v");
                        cache.get(&format!("{t}-{}", i / 2));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
    }

    #[tokio::test]
    async fn test_sweeper_drops_expired_entries() {
        let cache = Arc::new(small(10, Duration::from_millis(1)));
        cache.set("k", "v");
        tokio::time::sleep(Duration::from_millis(5)).await;

        let sweeper = Sweeper::spawn(Arc::clone(&cache), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.is_empty());
        sweeper.shutdown().await;
    }
}
