use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{public_url, ObjectStore};

/// Uploads objects with `PUT {endpoint}/{path}` to an HTTP object storage
/// service, authenticating with a bearer key when one is configured.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    public_url: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, api_key: Option<String>, public_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            public_url: public_url.to_string(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<String> {
        let url = self.object_url(path);
        tracing::debug!(url = %url, size = bytes.len(), "Uploading object");

        let mut request = self.client.put(&url).body(bytes);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        request
            .send()
            .await
            .context("Failed to reach object storage")?
            .error_for_status()
            .context("Object storage rejected upload")?;

        Ok(public_url(&self.public_url, path))
    }
}
