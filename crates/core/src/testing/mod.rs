//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the transcoder and cloud
//! uploader traits, allowing engine and API tests to run without ffmpeg or
//! a storage backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use convertino_core::testing::{MockCloudUploader, MockTranscoder};
//!
//! let transcoder = MockTranscoder::new().fail_on("broken.mp3");
//! let uploader = MockCloudUploader::new();
//!
//! // Use in an engine or AppState...
//! ```

mod mock_cloud;
mod mock_transcoder;

pub use mock_cloud::{MockCloudUploader, RecordedUpload};
pub use mock_transcoder::{MockTranscoder, RecordedTranscode, TranscodeCounters};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::engine::ConversionBatch;
    use crate::job::SourceFile;

    /// An inline source file whose content is its own name.
    pub fn inline_file(name: &str) -> SourceFile {
        SourceFile::inline(name, name.as_bytes().to_vec())
    }

    /// A batch of inline files named `<stem>.<source>` for each stem.
    pub fn inline_batch(source: &str, target: &str, stems: &[&str]) -> ConversionBatch {
        ConversionBatch::new(source, target).with_files(
            stems
                .iter()
                .map(|stem| inline_file(&format!("{stem}.{source}"))),
        )
    }
}
