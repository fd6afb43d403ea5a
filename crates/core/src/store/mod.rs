//! Result store for converted artifacts.
//!
//! Artifacts are kept in memory for a configurable TTL (30 minutes by
//! default). Each artifact carries a [`RetrievalHandle`]: an opaque token
//! derived from a per-store secret, valid until the artifact expires.
//!
//! # Example
//!
//! ```ignore
//! use convertino_core::store::{ResultStore, StoreConfig};
//!
//! let store = Arc::new(ResultStore::new(StoreConfig::default()));
//! let _sweeper = store.spawn_sweeper(store.config().sweep_interval(), cancel.clone());
//!
//! let artifact = store.get_by_token(&job_id, &token).await?;
//! ```

mod config;
mod error;
mod memory;
mod types;

pub use config::StoreConfig;
pub use error::StoreError;
pub use memory::ResultStore;
pub use types::{ArtifactPayload, ArtifactSummary, ResultArtifact, RetrievalHandle};
