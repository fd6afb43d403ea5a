//! Transcoder selection.

use std::sync::Arc;

use super::error::ConverterError;
use super::traits::Transcoder;
use crate::format::MediaFormat;

/// Ordered collection of transcoders; the first one that supports a pair wins.
#[derive(Clone, Default)]
pub struct TranscoderSet {
    transcoders: Vec<Arc<dyn Transcoder>>,
}

impl TranscoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transcoder with lower priority than those already registered.
    pub fn with(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoders.push(transcoder);
        self
    }

    pub fn register(&mut self, transcoder: Arc<dyn Transcoder>) {
        self.transcoders.push(transcoder);
    }

    pub fn is_empty(&self) -> bool {
        self.transcoders.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.transcoders.iter().map(|t| t.name().to_string()).collect()
    }

    /// Picks the transcoder for a source/target pair.
    pub fn select(
        &self,
        source: &MediaFormat,
        target: &MediaFormat,
    ) -> Result<Arc<dyn Transcoder>, ConverterError> {
        self.transcoders
            .iter()
            .find(|t| t.supports(source, target))
            .cloned()
            .ok_or_else(|| ConverterError::NoTranscoder {
                category: source.category(),
                source_ext: source.extension().to_string(),
                target_ext: target.extension().to_string(),
            })
    }

    /// Validates every registered transcoder, stopping at the first failure.
    pub async fn validate_all(&self) -> Result<(), ConverterError> {
        for transcoder in &self.transcoders {
            transcoder.validate().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TranscoderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscoderSet")
            .field("transcoders", &self.names())
            .finish()
    }
}
