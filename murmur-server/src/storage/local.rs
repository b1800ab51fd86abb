use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::{public_url, ObjectStore};

/// Writes objects below a local directory that the server exposes as
/// static files.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<String> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Invalid object path: {}", path);
        }

        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        tracing::debug!(path = %path, size = bytes.len(), "Writing object to local storage");

        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;

        Ok(public_url(&self.public_url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("murmur-media-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let root = temp_root();
        let store = LocalObjectStore::new(&root, "/media/");

        let url = store
            .upload(b"png bytes".to_vec(), "posts/1/abc-photo.png")
            .await
            .unwrap();
        assert_eq!(url, "/media/posts/1/abc-photo.png");

        let written = tokio::fs::read(root.join("posts/1/abc-photo.png")).await.unwrap();
        assert_eq!(written, b"png bytes");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_paths() {
        let store = LocalObjectStore::new(temp_root(), "/media");

        assert!(store.upload(vec![1], "../outside.png").await.is_err());
        assert!(store.upload(vec![1], "/etc/passwd").await.is_err());
    }
}
