//! Mock transcoder for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};

use crate::converter::{ConverterError, TranscodeOutput, TranscodeRequest, Transcoder};
use crate::format::MediaFormat;

/// A recorded transcode call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    pub job_id: String,
    pub source_name: String,
    pub source: String,
    pub target: String,
    pub input_len: usize,
}

#[derive(Debug, Default)]
struct CountersInner {
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Shared call and concurrency counters of a [`MockTranscoder`].
///
/// Cloned handles observe the same counters, so a test can keep one after
/// moving the transcoder into an engine.
#[derive(Debug, Clone, Default)]
pub struct TranscodeCounters {
    inner: Arc<CountersInner>,
}

impl TranscodeCounters {
    /// Number of transcode calls started.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Number of transcodes currently in progress.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Highest number of transcodes ever in progress at once.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ActiveGuard {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard {
            counters: self.clone(),
        }
    }
}

struct ActiveGuard {
    counters: TranscodeCounters,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.counters.inner.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Echo the input bytes as the converted output
/// - Restrict supported pairs
/// - Simulate slow conversions (delay) or block until released (gate)
/// - Simulate failures per source file or for the next call
/// - Panic on a source file, like a buggy transcoder would
/// - Track calls and peak concurrency
///
/// # Example
///
/// ```rust,ignore
/// use convertino_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new()
///     .with_delay(Duration::from_millis(50))
///     .fail_on("broken.mp3");
/// let counters = transcoder.counters();
///
/// // hand the transcoder to an engine, run a batch...
///
/// assert!(counters.peak() <= 4);
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    name: String,
    /// Supported `(source, target)` pairs; `None` supports everything.
    pairs: Option<Vec<(String, String)>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    /// Source file names whose transcode fails.
    fail_on: Vec<String>,
    /// Source file names whose transcode panics.
    panic_on: Vec<String>,
    recorded: Arc<RwLock<Vec<RecordedTranscode>>>,
    /// If set, the next transcode will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    counters: TranscodeCounters,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a mock named `mock` that supports every pair.
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pairs: None,
            delay: None,
            gate: None,
            fail_on: Vec::new(),
            panic_on: Vec::new(),
            recorded: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            counters: TranscodeCounters::default(),
        }
    }

    /// Only support the given pair (may be called repeatedly).
    pub fn only_pair(mut self, source: &str, target: &str) -> Self {
        let pair = (
            MediaFormat::new(source).extension().to_string(),
            MediaFormat::new(target).extension().to_string(),
        );
        self.pairs.get_or_insert_with(Vec::new).push(pair);
        self
    }

    /// Sleep for `delay` inside every transcode.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block every transcode until a permit is available on `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail every transcode of a source file with this name.
    pub fn fail_on(mut self, source_name: impl Into<String>) -> Self {
        self.fail_on.push(source_name.into());
        self
    }

    /// Panic inside every transcode of a source file with this name.
    pub fn panic_on(mut self, source_name: impl Into<String>) -> Self {
        self.panic_on.push(source_name.into());
        self
    }

    /// Handle to the call and concurrency counters.
    pub fn counters(&self) -> TranscodeCounters {
        self.counters.clone()
    }

    /// Get all recorded transcodes.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.recorded.read().await.clone()
    }

    /// Configure the next transcode to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, source: &MediaFormat, target: &MediaFormat) -> bool {
        match &self.pairs {
            None => true,
            Some(pairs) => pairs
                .iter()
                .any(|(s, t)| s == source.extension() && t == target.extension()),
        }
    }

    async fn transcode(&self, request: TranscodeRequest) -> Result<TranscodeOutput, ConverterError> {
        let _active = self.counters.enter();

        self.recorded.write().await.push(RecordedTranscode {
            job_id: request.job_id.clone(),
            source_name: request.source_name.clone(),
            source: request.source.extension().to_string(),
            target: request.target.extension().to_string(),
            input_len: request.input.len(),
        });

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|_| ConverterError::Cancelled)?;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if self.panic_on.iter().any(|name| name == &request.source_name) {
            panic!("mock panic for {}", request.source_name);
        }

        if self.fail_on.iter().any(|name| name == &request.source_name) {
            return Err(ConverterError::conversion_failed(
                format!("mock failure for {}", request.source_name),
                Some("mock stderr".to_string()),
            ));
        }

        Ok(TranscodeOutput {
            bytes: request.input.to_vec(),
            duration_ms: self.delay.map(|d| d.as_millis() as u64).unwrap_or(0),
        })
    }
}
