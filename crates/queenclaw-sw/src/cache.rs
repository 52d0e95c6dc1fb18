//! Cache generations and response snapshots.
//!
//! A generation is a named map of request key to response snapshot. Writes
//! replace a whole entry at once; there is no partial update and no stored
//! freshness metadata.

use bytes::Bytes;
use hashbrown::HashMap;
use http::{HeaderMap, StatusCode};

/// A stored response snapshot.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Response status.
    pub status: StatusCode,

    /// Response status text.
    pub status_text: String,

    /// Response headers.
    pub headers: HeaderMap,

    /// Response body.
    pub body: Bytes,
}

/// One cache generation.
#[derive(Debug, Default)]
pub struct Cache {
    name: String,
    entries: HashMap<String, CachedResponse>,
}

impl Cache {
    /// Create a new, empty generation.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Get the generation's version tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a snapshot, replacing any existing entry for the key.
    pub fn put(&mut self, key: impl Into<String>, snapshot: CachedResponse) {
        self.entries.insert(key.into(), snapshot);
    }

    /// Look up a snapshot by request key.
    pub fn lookup(&self, key: &str) -> Option<CachedResponse> {
        self.entries.get(key).cloned()
    }

    /// Check whether an entry exists for the key.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Delete an entry.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Get all request keys.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the generation holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All cache generations known to the coordinator.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: HashMap<String, Cache>,
}

impl CacheStorage {
    /// Create new cache storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a generation, creating it if absent.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    /// Insert a fully-populated generation, replacing any previous one
    /// under the same tag.
    pub fn insert(&mut self, cache: Cache) {
        self.caches.insert(cache.name().to_string(), cache);
    }

    /// Get a generation without creating it.
    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.caches.get(name)
    }

    /// Check whether a generation exists.
    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Delete a generation.
    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    /// Get all generation tags.
    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(body: &str) -> CachedResponse {
        CachedResponse {
            status: StatusCode::OK,
            status_text: "OK".to_string(),
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_put_and_lookup() {
        let mut cache = Cache::new("v1");
        cache.put("https://queenclaw.app/", snapshot("<html>"));

        let hit = cache.lookup("https://queenclaw.app/").unwrap();
        assert_eq!(hit.body, Bytes::from("<html>"));
        assert!(cache.lookup("https://queenclaw.app/missing").is_none());
    }

    #[test]
    fn test_put_replaces_whole_entry() {
        let mut cache = Cache::new("v1");
        cache.put("/k", snapshot("old"));
        cache.put("/k", snapshot("new"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("/k").unwrap().body, Bytes::from("new"));
    }

    #[test]
    fn test_delete_and_keys() {
        let mut cache = Cache::new("v1");
        cache.put("/a", snapshot("a"));
        cache.put("/b", snapshot("b"));

        assert_eq!(cache.keys().len(), 2);
        assert!(cache.delete("/a"));
        assert!(!cache.delete("/a"));
        assert_eq!(cache.keys(), vec!["/b".to_string()]);
    }

    #[test]
    fn test_storage_open_and_delete() {
        let mut storage = CacheStorage::new();
        assert!(!storage.has("v1"));

        storage.open("v1").put("/a", snapshot("a"));
        assert!(storage.has("v1"));
        assert!(storage.get("v1").unwrap().contains("/a"));

        assert!(storage.delete("v1"));
        assert!(!storage.has("v1"));
    }

    #[test]
    fn test_storage_insert_replaces_generation() {
        let mut storage = CacheStorage::new();
        storage.open("v1").put("/stale", snapshot("stale"));

        let mut fresh = Cache::new("v1");
        fresh.put("/fresh", snapshot("fresh"));
        storage.insert(fresh);

        let current = storage.get("v1").unwrap();
        assert!(current.contains("/fresh"));
        assert!(!current.contains("/stale"));
    }
}
