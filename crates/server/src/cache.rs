//! Fixed-capacity LRU cache shared between tasks.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;

use crate::error::{Result, ServiceError};

/// Least-recently-used cache behind a mutex.
///
/// Values are cloned out so the lock is never held across an `.await`.
pub struct BoundedCache<K, V> {
    inner: Mutex<LruCache<K, V>>,
    capacity: NonZeroUsize,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            ServiceError::InvalidConfig("cache capacity must be at least 1".to_string())
        })?;
        Ok(Self {
            inner: Mutex::new(LruCache::new(capacity)),
            capacity,
        })
    }

    /// Look up a value, marking it most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Insert a value, evicting the least recently used entry when full
    pub fn put(&self, key: K, value: V) {
        self.lock().put(key, value);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are independent; a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = BoundedCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        // Touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get(&"a"), Some(1));
        cache.put("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_put_replaces_existing_value() {
        let cache = BoundedCache::new(2).unwrap();
        cache.put(7u32, "old".to_string());
        cache.put(7u32, "new".to_string());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&7).as_deref(), Some("new"));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            BoundedCache::<u32, u32>::new(0),
            Err(ServiceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = BoundedCache::new(4).unwrap();
        cache.put(1u32, 1u32);
        assert!(cache.contains(&1));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
    }
}
