//! Process-lifetime memoization of remote query results.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Memoizes values by query key. Entries are never evicted and failed
/// fetches are not stored.
#[derive(Debug)]
pub struct QueryCache<V> {
    entries: Mutex<BTreeMap<String, Arc<V>>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<V> QueryCache<V> {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Returns the cached value for `key`, running `fetch` on a miss.
    ///
    /// The lock is not held while fetching. If two callers race on the same
    /// key, the first value stored wins and both receive it.
    ///
    /// # Errors
    ///
    /// Propagates the error from `fetch`; nothing is cached in that case.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            log::debug!("Cache hit: {key}");
            return Ok(value);
        }

        let value = Arc::new(fetch().await?);
        let mut entries = self.entries.lock().await;
        Ok(entries.entry(key.to_string()).or_insert(value).clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
