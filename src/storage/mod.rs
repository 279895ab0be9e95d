use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Photo storage is not configured")]
    NotConfigured,

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

/// Seam to the external photo CDN: raw image bytes plus a logical folder tag
/// in, a publicly addressable URL out. The data layer treats the returned URL
/// as opaque.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<String, StorageError>;
}

/// Cloudinary unsigned-upload client. Posts the image to the cloud's upload
/// endpoint with a preconfigured upload preset and returns `secure_url`.
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            upload_preset: config.upload_preset.clone(),
        }
    }

    fn upload_url(&self) -> Result<Url, StorageError> {
        let raw = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );
        Url::parse(&raw).map_err(|_| StorageError::NotConfigured)
    }
}

#[async_trait]
impl PhotoStorage for CloudinaryStorage {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<String, StorageError> {
        if self.cloud_name.is_empty() || self.upload_preset.is_empty() {
            return Err(StorageError::NotConfigured);
        }

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name("photo"));

        let response = self
            .client
            .post(self.upload_url()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(format!(
                "upload endpoint returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        body.get("secure_url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| StorageError::UploadFailed("response missing secure_url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    fn config(cloud_name: &str) -> StorageConfig {
        StorageConfig {
            cloud_name: cloud_name.to_string(),
            upload_preset: "scout-unsigned".to_string(),
            folder: "scout".to_string(),
        }
    }

    #[tokio::test]
    async fn unconfigured_storage_refuses_upload() {
        let storage = CloudinaryStorage::new(&config(""));
        let result = storage.upload(vec![0u8; 4], "scout").await;
        assert!(matches!(result, Err(StorageError::NotConfigured)));
    }

    #[test]
    fn builds_cloud_scoped_upload_url() {
        let storage = CloudinaryStorage::new(&config("demo"));
        let url = storage.upload_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
