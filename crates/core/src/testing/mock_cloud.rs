//! Mock cloud uploader for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cloud::{normalize_folder, AccessToken, CloudError, CloudUploader, UploadReceipt};
use crate::store::ResultArtifact;

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub token: String,
    pub file_name: String,
    pub folder_path: Option<String>,
    pub bytes: Vec<u8>,
}

/// Mock implementation of the CloudUploader trait.
///
/// Records every upload and refuses expired tokens the same way the HTTP
/// uploader does.
#[derive(Debug, Default)]
pub struct MockCloudUploader {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// If set, the next upload will fail with this error.
    next_error: Arc<RwLock<Option<CloudError>>>,
}

impl MockCloudUploader {
    /// Create a new mock uploader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_error(&self, error: CloudError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl CloudUploader for MockCloudUploader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(
        &self,
        token: &AccessToken,
        artifact: &ResultArtifact,
        folder_path: Option<&str>,
    ) -> Result<UploadReceipt, CloudError> {
        if token.is_expired() {
            return Err(CloudError::TokenExpired);
        }
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let folder_path = normalize_folder(folder_path);
        self.uploads.write().await.push(RecordedUpload {
            token: token.value().to_string(),
            file_name: artifact.file_name.clone(),
            folder_path: folder_path.clone(),
            bytes: artifact.bytes.clone(),
        });

        Ok(UploadReceipt {
            file_name: artifact.file_name.clone(),
            folder_path,
            size_bytes: artifact.size_bytes(),
            uploaded_at: Utc::now(),
        })
    }
}
