//! TTL cache for raw API responses, so repeated fetches inside the window
//! do not spend rate-limited calls
//!
//! Entries live in memory and, when a file is configured, on disk, so the
//! window also spans separate runs of the CLI.

use cached::{Cached, TimedCache};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Cache key for one API request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// API function name (e.g. `NEWS_SENTIMENT`)
    pub function: String,
    /// Request parameters other than the API key, as a JSON string
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(function: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            function: function.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }

    fn disk_key(&self) -> String {
        format!("{}?{}", self.function, self.params)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    stored_at: DateTime<Utc>,
    value: serde_json::Value,
}

/// JSON file of timestamped responses
///
/// Disk failures are logged and treated as misses.
#[derive(Debug)]
struct DiskStore {
    path: PathBuf,
    ttl: Duration,
    // serializes read-modify-write of the file within this process
    lock: Mutex<()>,
}

impl DiskStore {
    fn is_fresh(&self, entry: &DiskEntry) -> bool {
        let age = (Utc::now() - entry.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }

    async fn load(&self) -> HashMap<String, DiskEntry> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable cache file {}: {}", self.path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Failed to read cache file {}: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }

    async fn save(&self, entries: &HashMap<String, DiskEntry>) {
        if let Err(e) = self.try_save(entries).await {
            warn!("Failed to write cache file {}: {}", self.path.display(), e);
        }
    }

    async fn try_save(&self, entries: &HashMap<String, DiskEntry>) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }

    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await;
        entries
            .remove(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value)
    }

    async fn put(&self, key: String, value: serde_json::Value) {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await;
        entries.retain(|_, entry| self.is_fresh(entry));
        entries.insert(
            key,
            DiskEntry {
                stored_at: Utc::now(),
                value,
            },
        );
        self.save(&entries).await;
    }

    async fn remove(&self, key: &str) {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await;
        if entries.remove(key).is_some() {
            self.save(&entries).await;
        }
    }

    async fn clear(&self) {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed cache file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove cache file {}: {}", self.path.display(), e),
        }
    }
}

/// Thread-safe cache of JSON responses
#[derive(Clone)]
pub struct FetchCache {
    cache: Arc<RwLock<TimedCache<CacheKey, serde_json::Value>>>,
    disk: Option<Arc<DiskStore>>,
}

impl FetchCache {
    /// Create an in-memory cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            disk: None,
        }
    }

    /// Create a cache that also keeps entries in `path`
    pub fn persistent(ttl: Duration, path: impl Into<PathBuf>) -> Self {
        Self {
            disk: Some(Arc::new(DiskStore {
                path: path.into(),
                ttl,
                lock: Mutex::new(()),
            })),
            ..Self::new(ttl)
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.disk.as_deref().map(|disk| disk.path.as_path())
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        {
            // TimedCache evicts on read, so a read needs the write lock
            let mut cache = self.cache.write().await;
            if let Some(value) = cache.cache_get(key) {
                return Some(value.clone());
            }
        }

        match &self.disk {
            Some(disk) => disk.get(&key.disk_key()).await,
            None => None,
        }
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: serde_json::Value) {
        if let Some(disk) = &self.disk {
            disk.put(key.disk_key(), value.clone()).await;
        }
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value, or run `fetcher` and cache its success
    ///
    /// Errors are never cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: CacheKey,
        fetcher: F,
    ) -> Result<serde_json::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<serde_json::Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!("Cache hit for {}", key.function);
            return Ok(value);
        }

        debug!("Cache miss for {}", key.function);
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &CacheKey) {
        {
            let mut cache = self.cache.write().await;
            let _ = cache.cache_remove(key);
        }
        if let Some(disk) = &self.disk {
            disk.remove(&key.disk_key()).await;
        }
    }

    /// Clear all cached entries, in memory and on disk
    pub async fn clear(&self) {
        {
            let mut cache = self.cache.write().await;
            cache.cache_clear();
        }
        if let Some(disk) = &self.disk {
            disk.clear().await;
        }
    }

    /// Number of entries held in memory
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the in-memory cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_key(limit: u32) -> CacheKey {
        CacheKey::new("NEWS_SENTIMENT", serde_json::json!({"limit": limit, "sort": "RELEVANCE"}))
    }

    #[test]
    fn test_cache_key_distinguishes_params() {
        assert_eq!(news_key(50), news_key(50));
        assert_ne!(news_key(50), news_key(10));
        assert!(news_key(50).params.contains("RELEVANCE"));
    }

    #[tokio::test]
    async fn test_get_or_fetch_uses_cache() {
        let cache = FetchCache::new(Duration::from_secs(60));
        let value = serde_json::json!({"feed": []});

        let mut calls = 0;
        let first = cache
            .get_or_fetch(news_key(50), || {
                calls += 1;
                async { Ok::<_, String>(value.clone()) }
            })
            .await
            .unwrap();
        assert_eq!(first, value);

        let second = cache
            .get_or_fetch(news_key(50), || {
                calls += 1;
                async { Ok::<_, String>(serde_json::json!({"feed": ["other"]})) }
            })
            .await
            .unwrap();

        assert_eq!(second, value);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = FetchCache::new(Duration::from_secs(60));

        let failed = cache
            .get_or_fetch(news_key(5), || async { Err::<serde_json::Value, _>("boom") })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let cache = FetchCache::new(Duration::from_millis(20));
        cache.insert(news_key(1), serde_json::json!(1)).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get(&news_key(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_persistent_entries_survive_a_new_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");

        let first = FetchCache::persistent(Duration::from_secs(60), &path);
        first.insert(news_key(50), serde_json::json!({"feed": ["a"]})).await;
        assert!(path.exists());

        // a later run starts with an empty memory layer
        let second = FetchCache::persistent(Duration::from_secs(60), &path);
        let value = second
            .get_or_fetch(news_key(50), || async {
                Err::<serde_json::Value, _>("network must not be used")
            })
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"feed": ["a"]}));
    }

    #[tokio::test]
    async fn test_persistent_entries_expire() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");

        FetchCache::persistent(Duration::from_millis(20), &path)
            .insert(news_key(1), serde_json::json!(1))
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let later = FetchCache::persistent(Duration::from_millis(20), &path);
        assert!(later.get(&news_key(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("market.json");

        let cache = FetchCache::persistent(Duration::from_secs(60), &path);
        cache.insert(news_key(1), serde_json::json!(1)).await;
        assert!(path.exists());

        cache.clear().await;
        assert!(!path.exists());
        let fresh = FetchCache::persistent(Duration::from_secs(60), &path);
        assert!(fresh.get(&news_key(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");
        std::fs::write(&path, "not json").unwrap();

        let cache = FetchCache::persistent(Duration::from_secs(60), &path);
        assert!(cache.get(&news_key(1)).await.is_none());

        cache.insert(news_key(1), serde_json::json!(1)).await;
        let reread = FetchCache::persistent(Duration::from_secs(60), &path);
        assert_eq!(reread.get(&news_key(1)).await, Some(serde_json::json!(1)));
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = FetchCache::new(Duration::from_secs(60));
        for limit in 0..3 {
            cache.insert(news_key(limit), serde_json::json!(limit)).await;
        }
        assert_eq!(cache.len().await, 3);

        cache.invalidate(&news_key(0)).await;
        assert!(cache.get(&news_key(0)).await.is_none());

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
