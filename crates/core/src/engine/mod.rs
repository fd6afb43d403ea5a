//! Conversion engine.
//!
//! Accepts same-format batches, creates one job per file and runs the jobs
//! concurrently on a bounded worker pool. Results are aggregated per job:
//! one failing file never affects its siblings.
//!
//! # Example
//!
//! ```ignore
//! use convertino_core::engine::{ConversionBatch, ConversionEngine, EngineConfig};
//! use convertino_core::job::SourceFile;
//!
//! let engine = ConversionEngine::new(EngineConfig::default(), transcoders, store);
//! let batch = ConversionBatch::new("mp3", "wav")
//!     .with_file(SourceFile::inline("a.mp3", bytes));
//!
//! let handle = engine.submit(batch).await?;
//! let outcomes = engine.await_batch(&handle.batch_id, Duration::from_secs(30)).await?;
//! ```

mod config;
#[allow(clippy::module_inception)]
mod engine;
mod error;
mod types;

pub use config::EngineConfig;
pub use engine::ConversionEngine;
pub use error::{EngineError, ValidationError};
pub use types::{BatchHandle, BatchSummary, ConversionBatch, JobOutcome, PoolStatus};
