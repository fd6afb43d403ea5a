//! Types for the cloud hand-off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token for the storage API, passed explicitly into every call.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Sets the instant after which the token is no longer sent.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Confirmation of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub file_name: String,
    /// Destination folder, `None` for the user's root.
    pub folder_path: Option<String>,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Normalizes a destination folder: empty and `root` both mean the root.
pub fn normalize_folder(folder_path: Option<&str>) -> Option<String> {
    let folder = folder_path?.trim().trim_matches('/');
    if folder.is_empty() || folder == "root" {
        None
    } else {
        Some(folder.to_string())
    }
}
