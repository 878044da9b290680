use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Process-wide TTL memoization for slow-changing reads (category tree,
/// site settings, admin sessions). Constructed once at startup and
/// injected into the services that need it; nothing here survives a
/// restart, every cached value is reconstructible from the database.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// An expired entry is evicted as a side effect of the read.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Evicts every key containing the given substring. Admin mutations
    /// call this so stale catalog/settings reads are never served.
    pub async fn invalidate_pattern(&self, pattern: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|key, _| !key.contains(pattern));
    }

    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_value_before_expiry() {
        let cache = TtlCache::new();
        cache.insert("k", 42u32, Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(42));
    }

    #[tokio::test]
    async fn expired_entry_is_absent_and_evicted() {
        let cache = TtlCache::new();
        cache.insert("k", "stale", Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("k").await, None);
        // The read itself removed the dead entry.
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn invalidate_pattern_only_touches_matching_keys() {
        let cache = TtlCache::new();
        let ttl = Duration::from_secs(60);
        cache.insert("catalog:tree", 1, ttl).await;
        cache.insert("catalog:featured", 2, ttl).await;
        cache.insert("settings:popup_title", 3, ttl).await;

        cache.invalidate_pattern("catalog").await;

        assert_eq!(cache.get("catalog:tree").await, None);
        assert_eq!(cache.get("catalog:featured").await, None);
        assert_eq!(cache.get("settings:popup_title").await, Some(3));
    }

    #[tokio::test]
    async fn insert_overwrites_and_refreshes_expiry() {
        let cache = TtlCache::new();
        cache.insert("k", 1, Duration::from_millis(10)).await;
        cache.insert("k", 2, Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("k").await, Some(2));
    }
}
