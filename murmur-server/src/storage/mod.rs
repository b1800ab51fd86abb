//! Object storage for post media.
//!
//! Handlers only see the [`ObjectStore`] trait. The configured backend
//! decides where bytes end up and which public URL comes back.

mod http;
mod local;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Storage, StorageBackend};

/// Destination for uploaded media
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` and return the public URL of the object
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<String>;
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Image upload failed: {0:#}")]
    ImageUploadFailed(anyhow::Error),

    #[error("Video upload failed: {0:#}")]
    VideoUploadFailed(anyhow::Error),
}

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Build the object store selected in configuration
pub fn from_settings(storage: &Storage) -> Result<Arc<dyn ObjectStore>> {
    match storage.backend {
        StorageBackend::Local => Ok(Arc::new(LocalObjectStore::new(
            &storage.local_dir,
            &storage.public_url,
        ))),
        StorageBackend::Http => {
            let endpoint = storage
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.endpoint is required for the http backend"))?;
            Ok(Arc::new(HttpObjectStore::new(
                endpoint,
                storage.api_key.clone(),
                &storage.public_url,
            )))
        }
    }
}

/// Keep only characters that are safe in an object key
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Object key for a post attachment: `posts/{user_id}/{uuid}-{file_name}`
pub fn media_path(user_id: i64, file_name: &str) -> String {
    format!(
        "posts/{}/{}-{}",
        user_id,
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

/// Join a public URL prefix and an object key
pub(crate) fn public_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn upload_one(
    store: &dyn ObjectStore,
    user_id: i64,
    file: Option<MediaFile>,
) -> Result<Option<String>> {
    match file {
        Some(file) => {
            let path = media_path(user_id, &file.file_name);
            store.upload(file.bytes, &path).await.map(Some)
        }
        None => Ok(None),
    }
}

/// Upload a post's image and video concurrently.
///
/// Either failure fails the whole call. An asset that did upload is left
/// in place.
pub async fn upload_post_media(
    store: &dyn ObjectStore,
    user_id: i64,
    image: Option<MediaFile>,
    video: Option<MediaFile>,
) -> Result<(Option<String>, Option<String>), UploadError> {
    let (image_url, video_url) = tokio::join!(
        upload_one(store, user_id, image),
        upload_one(store, user_id, video),
    );

    let image_url = image_url.map_err(UploadError::ImageUploadFailed)?;
    let video_url = video_url.map_err(UploadError::VideoUploadFailed)?;
    Ok((image_url, video_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records uploads and fails any path containing `fail`
    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn upload(&self, _bytes: Vec<u8>, path: &str) -> Result<String> {
            if path.contains("fail") {
                anyhow::bail!("storage rejected {}", path);
            }
            self.uploads.lock().unwrap().push(path.to_string());
            Ok(public_url("https://cdn.example.com", path))
        }
    }

    fn media(name: &str) -> MediaFile {
        MediaFile {
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_media_path_is_scoped_and_sanitized() {
        let path = media_path(7, "../my photo.png");
        assert!(path.starts_with("posts/7/"));
        assert!(path.ends_with("-_my_photo.png"));
        assert!(!path.contains(".."));

        assert!(media_path(7, "...").ends_with("-upload"));
    }

    #[tokio::test]
    async fn test_upload_both_assets() {
        let store = RecordingStore::default();
        let (image, video) = upload_post_media(&store, 1, Some(media("a.png")), Some(media("b.mp4")))
            .await
            .unwrap();

        assert!(image.unwrap().starts_with("https://cdn.example.com/posts/1/"));
        assert!(video.unwrap().ends_with("-b.mp4"));
        assert_eq!(store.uploads.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_media_uploads_nothing() {
        let store = RecordingStore::default();
        let result = upload_post_media(&store, 1, None, None).await.unwrap();
        assert_eq!(result, (None, None));
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_reported_per_asset() {
        let store = RecordingStore::default();

        let err = upload_post_media(&store, 1, Some(media("fail.png")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::ImageUploadFailed(_)));

        // The image still lands even though the video fails
        let err = upload_post_media(&store, 1, Some(media("ok.png")), Some(media("fail.mp4")))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::VideoUploadFailed(_)));
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }
}
