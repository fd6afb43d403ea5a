//! Conversion job model.
//!
//! A [`ConversionJob`] is one file's conversion unit of work. Jobs are
//! created by the engine at submit time and move through a monotonic state
//! machine:
//!
//! ```text
//! Pending -> Running -> Succeeded | Failed | Cancelled
//! Pending -> Cancelled
//! ```
//!
//! Source bytes are referenced through a [`ContentHandle`] so that uploaded
//! files and server-local paths are handled the same way.

mod conversion;
mod source;
mod types;

pub use conversion::{ConversionJob, JobSnapshot, JobTransitionError};
pub use source::{ContentHandle, SourceError, SourceFile, SourceRoot};
pub use types::{BatchId, JobError, JobErrorKind, JobId, JobState};
