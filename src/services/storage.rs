//! Supabase Storage adapter for durable token images
//!
//! Uploads are content-addressed (fresh UUID path per image) and cheap, so a
//! crash between blob upload and database write orphans at most one blob.

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

/// Error types for object-store calls
#[derive(Debug)]
pub enum StorageError {
    /// Transport-level failure (connection, timeout, malformed body)
    Http(String),
    /// Non-2xx response from the storage API
    Api { status: u16, message: String },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Http(msg) => write!(f, "Storage request failed: {}", msg),
            StorageError::Api { status, message } => {
                write!(f, "Storage error {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Seam for the object store so handlers can be tested against stubs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Fetch the bytes at `source_url` and store them under `path`,
    /// returning the public URL of the stored blob
    async fn upload_from_url(&self, source_url: &str, path: &str) -> Result<String, StorageError>;

    fn public_url(&self, path: &str) -> String;

    async fn remove(&self, path: &str) -> Result<(), StorageError>;
}

#[derive(Clone)]
pub struct SupabaseStorageService {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl SupabaseStorageService {
    pub fn new(base_url: String, api_key: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            bucket,
        }
    }
}

async fn error_from_response(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();

    StorageError::Api { status, message }
}

#[async_trait]
impl ObjectStore for SupabaseStorageService {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        info!(path = path, size = bytes.len(), "Uploading blob to storage");

        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .header("cache-control", "3600")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }

    async fn upload_from_url(&self, source_url: &str, path: &str) -> Result<String, StorageError> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        self.upload(path, bytes.to_vec(), &content_type).await?;

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        info!(path = path, "Removing blob from storage");

        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }
}
