//! Content-hash PDF cache
//!
//! Keyed by the SHA-256 of the rendered HTML, so any change to the quotation
//! produces a new key and stale PDFs are never served.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hex SHA-256 of the HTML
pub fn content_key(html: &str) -> String {
    hex::encode(Sha256::digest(html.as_bytes()))
}

struct CacheEntry {
    bytes: Arc<Vec<u8>>,
    inserted_at: Instant,
}

pub struct PdfCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl PdfCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Fresh entry for `key`; an expired entry is dropped on the way
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        let mut map = self.entries.lock().await;
        let expired = match map.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.bytes.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            map.remove(key);
        }
        None
    }

    /// Store a PDF, evicting the oldest entry when full
    pub async fn insert(&self, key: String, bytes: Arc<Vec<u8>>) {
        let mut map = self.entries.lock().await;
        if !map.contains_key(&key) && map.len() >= self.max_entries {
            let now = Instant::now();
            map.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
            if map.len() >= self.max_entries
                && let Some(oldest) = map
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
            {
                map.remove(&oldest);
            }
        }
        map.insert(
            key,
            CacheEntry {
                bytes,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries, returning how many were removed
    pub async fn cleanup(&self) -> usize {
        let mut map = self.entries.lock().await;
        let before = map.len();
        let now = Instant::now();
        map.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(tag: u8) -> Arc<Vec<u8>> {
        Arc::new(vec![b'%', b'P', b'D', b'F', tag])
    }

    #[test]
    fn test_content_key() {
        let a = content_key("<p>Munnar</p>");
        assert_eq!(a.len(), 64);
        assert_eq!(a, content_key("<p>Munnar</p>"));
        assert_ne!(a, content_key("<p>Alleppey</p>"));
    }

    #[tokio::test]
    async fn test_get_insert() {
        let cache = PdfCache::new(Duration::from_secs(60), 4);
        assert!(cache.get("k").await.is_none());
        cache.insert("k".to_string(), pdf(1)).await;
        assert_eq!(cache.get("k").await.unwrap()[4], 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_evicts_oldest_when_full() {
        let cache = PdfCache::new(Duration::from_secs(60), 2);
        cache.insert("a".to_string(), pdf(1)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("b".to_string(), pdf(2)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("c".to_string(), pdf(3)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entries() {
        let cache = PdfCache::new(Duration::from_millis(30), 8);
        cache.insert("a".to_string(), pdf(1)).await;
        cache.insert("b".to_string(), pdf(2)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(cache.get("a").await.is_none());
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.cleanup().await, 1);
        assert!(cache.is_empty().await);
    }
}
