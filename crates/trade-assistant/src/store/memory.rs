//! In-memory backend

use super::ObjectStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Objects held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_replaces() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        store.put("k", b"one".to_vec(), "text/plain").await.expect("put");
        store.put("k", b"two".to_vec(), "text/plain").await.expect("put");
        assert_eq!(store.get("k").await.expect("get"), Some(b"two".to_vec()));
        assert_eq!(store.len().await, 1);
    }
}
