//! Key-value document storage
//!
//! Every piece of persistent state lives in a document addressed by a
//! slash-separated key. Backends only move bytes; [`DocumentStore`] adds JSON
//! and text encoding on top.
//!
//! Reads distinguish "key absent" (`Ok(None)`) from a failing backend
//! (`Err(AssistantError::Store)`); callers decide what absence means.

pub mod keys;
pub mod local;
pub mod memory;
pub mod s3;

use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

/// Raw byte storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a whole object; `None` when the key does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a whole object
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// JSON and text documents over an [`ObjectStore`]
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn ObjectStore>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self { backend }
    }

    /// Fresh in-memory store
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Read a UTF-8 text document
    pub async fn get_text(&self, key: &str) -> Result<Option<String>> {
        match self.backend.get(key).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| AssistantError::store(key, format!("not valid UTF-8: {e}"))),
            None => Ok(None),
        }
    }

    /// Write a UTF-8 text document
    pub async fn put_text(&self, key: &str, text: &str) -> Result<()> {
        self.backend
            .put(key, text.as_bytes().to_vec(), "text/plain; charset=utf-8")
            .await
    }

    /// Read and decode a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.backend.get(key).await? else {
            tracing::debug!("Document {} not found in {}", key, self.backend.name());
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            tracing::warn!("Document {} is not valid JSON: {}", key, e);
            AssistantError::Json(e)
        })
    }

    /// Encode and write a JSON document
    pub async fn put_json<T: Serialize + ?Sized + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let body = serde_json::to_vec_pretty(value)?;
        self.backend.put(key, body, "application/json").await?;
        tracing::debug!("Saved {} to {}", key, self.backend.name());
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}
