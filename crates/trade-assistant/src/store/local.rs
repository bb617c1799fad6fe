//! Local filesystem backend

use super::ObjectStore;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Objects stored as files under a root directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AssistantError::store(key, "key must be a relative path"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AssistantError::store(key, e)),
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AssistantError::store(key, e))?;
        }

        // Readers never observe a half-written file
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| AssistantError::store(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AssistantError::store(key, e))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::new(dir.path());

        store
            .put("portfolio/current_positions.json", b"{}".to_vec(), "application/json")
            .await
            .expect("put");

        assert!(dir.path().join("portfolio/current_positions.json").exists());
        assert!(!dir.path().join("portfolio/current_positions.tmp").exists());
        assert_eq!(
            store.get("portfolio/current_positions.json").await.expect("get"),
            Some(b"{}".to_vec())
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::new(dir.path());
        assert_eq!(store.get("history/operations_full.csv").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_unreadable_path_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where a file is expected
        std::fs::create_dir_all(dir.path().join("config/rules.json")).expect("mkdir");
        let store = LocalStore::new(dir.path());
        assert!(matches!(
            store.get("config/rules.json").await,
            Err(AssistantError::Store { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::new(dir.path());
        assert!(store.get("../secrets").await.is_err());
        assert!(store.put("/etc/passwd", vec![], "text/plain").await.is_err());
    }
}
