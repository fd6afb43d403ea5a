//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{TranscodeOutput, TranscodeRequest};
use crate::format::MediaFormat;

/// A capability that turns bytes of one format into bytes of another.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Whether this transcoder can convert `source` into `target`.
    fn supports(&self, source: &MediaFormat, target: &MediaFormat) -> bool;

    /// Converts the request's input bytes into the target format.
    async fn transcode(&self, request: TranscodeRequest)
        -> Result<TranscodeOutput, ConverterError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MediaCategory;
    use std::sync::Arc;

    struct ReverseTranscoder;

    #[async_trait]
    impl Transcoder for ReverseTranscoder {
        fn name(&self) -> &str {
            "reverse"
        }

        fn supports(&self, source: &MediaFormat, target: &MediaFormat) -> bool {
            source.category() == MediaCategory::Document && target.extension() == "txt"
        }

        async fn transcode(
            &self,
            request: TranscodeRequest,
        ) -> Result<TranscodeOutput, ConverterError> {
            let mut bytes = request.input.to_vec();
            bytes.reverse();
            Ok(TranscodeOutput {
                bytes,
                duration_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_custom_transcoder() {
        let transcoder = ReverseTranscoder;
        let request = TranscodeRequest {
            job_id: "job-1".to_string(),
            source_name: "notes.rtf".to_string(),
            source: MediaFormat::new("rtf"),
            target: MediaFormat::new("txt"),
            input: Arc::from(b"abc".to_vec()),
        };

        assert!(transcoder.supports(&request.source, &request.target));
        assert!(transcoder.validate().await.is_ok());
        let output = transcoder.transcode(request).await.unwrap();
        assert_eq!(output.bytes, b"cba");
    }
}
