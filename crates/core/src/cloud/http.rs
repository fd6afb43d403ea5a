//! HTTP uploader for the storage proxy API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::CloudConfig;
use super::error::CloudError;
use super::traits::CloudUploader;
use super::types::{normalize_folder, AccessToken, UploadReceipt};
use crate::metrics;
use crate::store::ResultArtifact;

/// Error body returned by the storage API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Uploads artifacts with a multipart `POST {base_url}/files/upload`.
///
/// The form carries the file under `files` and, unless the destination is
/// the root folder, the folder under `folderPath`.
pub struct HttpCloudUploader {
    client: Client,
    config: CloudConfig,
}

impl HttpCloudUploader {
    /// Create a new uploader.
    pub fn new(config: CloudConfig) -> Result<Self, CloudError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CloudError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    fn upload_url(&self) -> String {
        format!("{}/files/upload", self.config.base_url())
    }

    fn build_form(
        artifact: &ResultArtifact,
        folder: Option<&str>,
    ) -> Result<multipart::Form, CloudError> {
        let part = multipart::Part::bytes(artifact.bytes.clone())
            .file_name(artifact.file_name.clone())
            .mime_str(artifact.content_type)
            .map_err(|e| CloudError::Client(e.to_string()))?;

        let mut form = multipart::Form::new().part("files", part);
        if let Some(folder) = folder {
            form = form.text("folderPath", folder.to_string());
        }
        Ok(form)
    }

    async fn send(
        &self,
        token: &AccessToken,
        artifact: &ResultArtifact,
        folder: Option<String>,
    ) -> Result<UploadReceipt, CloudError> {
        if token.value().is_empty() {
            return Err(CloudError::MissingToken);
        }
        if token.is_expired() {
            return Err(CloudError::TokenExpired);
        }

        let form = Self::build_form(artifact, folder.as_deref())?;
        let url = self.upload_url();
        debug!(url = %url, file_name = %artifact.file_name, folder = ?folder, "Uploading artifact");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.value())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CloudError::Timeout
                } else if e.is_connect() {
                    CloudError::ConnectionFailed(e.to_string())
                } else {
                    CloudError::Client(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Failed to upload file".to_string());
            return Err(CloudError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(UploadReceipt {
            file_name: artifact.file_name.clone(),
            folder_path: folder,
            size_bytes: artifact.size_bytes(),
            uploaded_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CloudUploader for HttpCloudUploader {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(
        &self,
        token: &AccessToken,
        artifact: &ResultArtifact,
        folder_path: Option<&str>,
    ) -> Result<UploadReceipt, CloudError> {
        let result = self
            .send(token, artifact, normalize_folder(folder_path))
            .await;

        match &result {
            Ok(_) => metrics::CLOUD_UPLOADS.with_label_values(&["success"]).inc(),
            Err(e) => {
                warn!(file_name = %artifact.file_name, error = %e, "Cloud upload failed");
                metrics::CLOUD_UPLOADS.with_label_values(&[e.label()]).inc();
            }
        }
        result
    }
}
