//! Trait definitions for the cloud hand-off.

use async_trait::async_trait;

use super::error::CloudError;
use super::types::{AccessToken, UploadReceipt};
use crate::store::ResultArtifact;

/// Pushes a converted artifact to external storage on behalf of a user.
#[async_trait]
pub trait CloudUploader: Send + Sync {
    /// Returns the name of this uploader implementation.
    fn name(&self) -> &str;

    /// Uploads `artifact` into `folder_path` (`None`, empty or `root` for the
    /// user's root folder) using the caller's `token`.
    async fn upload(
        &self,
        token: &AccessToken,
        artifact: &ResultArtifact,
        folder_path: Option<&str>,
    ) -> Result<UploadReceipt, CloudError>;
}
