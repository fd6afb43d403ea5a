//! Cloud hand-off for converted artifacts.
//!
//! Pushes a stored artifact to the user's cloud storage through the storage
//! proxy API. The user's bearer token is an explicit [`AccessToken`] passed
//! into each call; nothing is read from ambient state.
//!
//! # Example
//!
//! ```ignore
//! use convertino_core::cloud::{AccessToken, CloudConfig, CloudUploader, HttpCloudUploader};
//!
//! let uploader = HttpCloudUploader::new(CloudConfig::new("https://storage.example.com/api"))?;
//! let receipt = uploader
//!     .upload(&AccessToken::new(jwt), &artifact, Some("music"))
//!     .await?;
//! ```

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::CloudConfig;
pub use error::CloudError;
pub use http::HttpCloudUploader;
pub use traits::CloudUploader;
pub use types::{normalize_folder, AccessToken, UploadReceipt};
