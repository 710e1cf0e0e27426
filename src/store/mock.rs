//! Mock object store implementation for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_key, ObjectStore, Result, StoreError, StoredObject};

/// Mock object store that keeps every put in memory, in write order.
pub struct MockObjectStore {
    bucket: String,
    objects: RwLock<Vec<(String, Vec<u8>)>>,
    fail_on_put: RwLock<bool>,
}

impl MockObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(Vec::new()),
            fail_on_put: RwLock::new(false),
        }
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    pub async fn put_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// All `(key, body)` pairs written so far.
    pub async fn objects(&self) -> Vec<(String, Vec<u8>)> {
        self.objects.read().await.clone()
    }

    /// Most recent body written at `key`.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<StoredObject> {
        if *self.fail_on_put.read().await {
            return Err(StoreError::PutFailed("Mock put failure".to_string()));
        }
        validate_key(key)?;
        let size = body.len();
        self.objects.write().await.push((key.to_string(), body));
        Ok(StoredObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            uri: format!("mem://{}/{}", self.bucket, key),
            size,
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_put_and_get() {
        let store = MockObjectStore::new("exports");
        let stored = store.put("a.json", b"[]".to_vec()).await.unwrap();

        assert_eq!(stored.uri, "mem://exports/a.json");
        assert_eq!(store.put_count().await, 1);
        assert_eq!(store.get("a.json").await, Some(b"[]".to_vec()));
        assert_eq!(store.get("b.json").await, None);
    }

    #[tokio::test]
    async fn test_mock_store_fail_on_put() {
        let store = MockObjectStore::new("exports");
        store.set_fail_on_put(true).await;

        assert!(store.put("a.json", b"[]".to_vec()).await.is_err());
        assert_eq!(store.put_count().await, 0);
    }
}
