//! DataLoader utilities for batch loading
///
/// Implements the DataLoader pattern for preventing N+1 query problems.
/// See: https://github.com/graphql/dataloader

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::User;
use crate::repository::{RepositoryError, UserRepository};

/// Batch loader trait for loading multiple items at once
#[async_trait]
pub trait BatchLoader<K, V>: Send + Sync
where
    K: Send + Sync + Clone + Eq + Hash,
    V: Send + Sync + Clone,
{
    type Error: Send;

    /// Load batch of items by keys
    ///
    /// This method should fetch all items for the given keys in a single
    /// database query or API call to avoid N+1 problems. Keys without a
    /// value are left out of the map.
    async fn load_batch(&self, keys: &[K]) -> Result<HashMap<K, V>, Self::Error>;
}

/// DataLoader with caching and batching
///
/// Lives for one GraphQL request: batches lookups and caches results so the
/// same key is never fetched twice within the request.
pub struct DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    loader: Arc<L>,
    cache: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V, L> DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    /// Create new DataLoader with a batch loader
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load a single item by key
    pub async fn load(&self, key: K) -> Result<Option<V>, L::Error> {
        let mut results = self.load_many(vec![key.clone()]).await?;
        Ok(results.remove(&key))
    }

    /// Load multiple items by keys
    ///
    /// Batches keys that aren't in cache and loads them together.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<HashMap<K, V>, L::Error> {
        let mut result = HashMap::new();
        let mut uncached_keys = Vec::new();

        {
            let cache = self.cache.lock().await;
            for key in keys {
                if let Some(value) = cache.get(&key) {
                    result.insert(key, value.clone());
                } else if !uncached_keys.contains(&key) {
                    uncached_keys.push(key);
                }
            }
        }

        if !uncached_keys.is_empty() {
            let batch_results = self.loader.load_batch(&uncached_keys).await?;

            let mut cache = self.cache.lock().await;
            for (k, v) in batch_results {
                cache.insert(k.clone(), v.clone());
                result.insert(k, v);
            }
        }

        Ok(result)
    }
}

impl<K, V, L> Clone for DataLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash + 'static,
    V: Send + Sync + Clone + 'static,
    L: BatchLoader<K, V> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            cache: self.cache.clone(),
        }
    }
}

/// Loads users by id through [`UserRepository::find_by_ids`]
pub struct UserBatchLoader {
    users: Arc<dyn UserRepository>,
}

impl UserBatchLoader {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl BatchLoader<Uuid, User> for UserBatchLoader {
    type Error = RepositoryError;

    async fn load_batch(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, User>, RepositoryError> {
        tracing::debug!(count = keys.len(), "batch loading users");
        let users = self.users.find_by_ids(keys).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

/// Per-request user loader
pub type UserLoader = DataLoader<Uuid, User, UserBatchLoader>;

impl UserLoader {
    pub fn for_users(users: Arc<dyn UserRepository>) -> Self {
        DataLoader::new(UserBatchLoader::new(users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TestLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BatchLoader<String, String> for TestLoader {
        type Error = std::convert::Infallible;

        async fn load_batch(
            &self,
            keys: &[String],
        ) -> Result<HashMap<String, String>, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(keys
                .iter()
                .filter(|k| !k.starts_with("missing"))
                .map(|k| (k.clone(), format!("value-{}", k)))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_dataloader_single_load() {
        let loader = DataLoader::new(TestLoader::default());
        let value = loader.load("key1".to_string()).await.unwrap();
        assert_eq!(value, Some("value-key1".to_string()));
    }

    #[tokio::test]
    async fn test_dataloader_caching() {
        let loader = DataLoader::new(TestLoader::default());

        loader.load("key1".to_string()).await.unwrap();
        let value = loader.load("key1".to_string()).await.unwrap();
        assert_eq!(value, Some("value-key1".to_string()));
        assert_eq!(loader.loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dataloader_batch_load() {
        let loader = DataLoader::new(TestLoader::default());

        let keys = vec![
            "key1".to_string(),
            "key2".to_string(),
            "key1".to_string(),
            "missing".to_string(),
        ];
        let results = loader.load_many(keys).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.get("key1"), Some(&"value-key1".to_string()));
        assert_eq!(results.get("key2"), Some(&"value-key2".to_string()));
        assert_eq!(loader.loader.calls.load(Ordering::SeqCst), 1);
    }
}
