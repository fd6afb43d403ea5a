//! Conversion engine implementation.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::{watch, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::error::{EngineError, ValidationError};
use super::types::{BatchHandle, BatchSummary, ConversionBatch, JobOutcome, PoolStatus};
use crate::converter::{ConverterError, TranscodeRequest, TranscoderSet};
use crate::format::{detect_format, is_compatible, MediaFormat};
use crate::job::{
    BatchId, ConversionJob, JobError, JobId, JobSnapshot, JobState, SourceFile,
};
use crate::metrics;
use crate::store::{ArtifactPayload, ArtifactSummary, ResultStore};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_succeeded: AtomicU64,
    total_failed: AtomicU64,
    total_cancelled: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            max_concurrent,
            total_succeeded: self.total_succeeded.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_cancelled: self.total_cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Bookkeeping for one submitted batch.
struct BatchRecord {
    job_ids: Vec<JobId>,
    source_format: MediaFormat,
    target_format: MediaFormat,
    cancel: CancellationToken,
    /// Number of jobs not yet terminal.
    remaining: Arc<watch::Sender<usize>>,
    created_at: DateTime<Utc>,
    submitted: Instant,
}

impl BatchRecord {
    fn is_finished(&self) -> bool {
        *self.remaining.borrow() == 0
    }
}

/// How a job task ended.
enum Finish {
    Succeeded(ArtifactSummary),
    Failed(JobError),
    Cancelled,
}

/// Everything a job task needs.
struct JobTask {
    job_id: JobId,
    batch_id: BatchId,
    file: SourceFile,
    source: MediaFormat,
    target: MediaFormat,
    cancel: CancellationToken,
    remaining: Arc<watch::Sender<usize>>,
}

struct Shared {
    config: EngineConfig,
    transcoders: TranscoderSet,
    store: Arc<ResultStore>,
    semaphore: Arc<Semaphore>,
    stats: PoolStats,
    jobs: RwLock<HashMap<JobId, ConversionJob>>,
    batches: RwLock<HashMap<BatchId, BatchRecord>>,
}

/// Runs conversion batches on a bounded pool of tokio tasks.
///
/// `submit` validates a batch, registers one `Pending` job per file and
/// returns immediately. Each job then waits for a pool slot, is marked
/// `Running`, transcodes its source through the [`TranscoderSet`] and
/// stores the artifact in the [`ResultStore`]. A slot is held until the job
/// is terminal, so at most `max_concurrent_jobs` jobs are ever `Running`.
///
/// Cloning the engine is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct ConversionEngine {
    shared: Arc<Shared>,
}

impl ConversionEngine {
    /// Creates a new engine.
    pub fn new(config: EngineConfig, transcoders: TranscoderSet, store: Arc<ResultStore>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        Self {
            shared: Arc::new(Shared {
                config,
                transcoders,
                store,
                semaphore,
                stats: PoolStats::default(),
                jobs: RwLock::new(HashMap::new()),
                batches: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn transcoders(&self) -> &TranscoderSet {
        &self.shared.transcoders
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.shared.store
    }

    /// Validates and enqueues a batch.
    ///
    /// Returns as soon as the jobs are registered; no conversion is awaited.
    pub async fn submit(&self, batch: ConversionBatch) -> Result<BatchHandle, EngineError> {
        let (source, target) = match validate_batch(&batch) {
            Ok(formats) => formats,
            Err(e) => {
                metrics::BATCHES_REJECTED
                    .with_label_values(&[e.reason()])
                    .inc();
                debug!(error = %e, "Rejected batch");
                return Err(e.into());
            }
        };

        let batch_id = BatchId::new();
        let cancel = CancellationToken::new();
        let (remaining, _) = watch::channel(batch.files.len());
        let remaining = Arc::new(remaining);

        let entries: Vec<(ConversionJob, SourceFile)> = batch
            .files
            .into_iter()
            .map(|file| {
                let job = ConversionJob::new(batch_id, &file, source.clone(), target.clone());
                (job, file)
            })
            .collect();
        let job_ids: Vec<JobId> = entries.iter().map(|(job, _)| job.id()).collect();

        // Jobs first, so a batch is never visible without its jobs.
        {
            let mut jobs = self.shared.jobs.write().await;
            for (job, _) in &entries {
                jobs.insert(job.id(), job.clone());
            }
        }
        {
            let mut batches = self.shared.batches.write().await;
            batches.insert(
                batch_id,
                BatchRecord {
                    job_ids: job_ids.clone(),
                    source_format: source.clone(),
                    target_format: target.clone(),
                    cancel: cancel.clone(),
                    remaining: Arc::clone(&remaining),
                    created_at: Utc::now(),
                    submitted: Instant::now(),
                },
            );
        }

        metrics::BATCHES_SUBMITTED.inc();
        metrics::JOBS_SUBMITTED.inc_by(job_ids.len() as u64);
        info!(
            batch_id = %batch_id,
            source = %source,
            target = %target,
            jobs = job_ids.len(),
            "Batch submitted"
        );

        for (job, file) in entries {
            let task = JobTask {
                job_id: job.id(),
                batch_id,
                file,
                source: source.clone(),
                target: target.clone(),
                cancel: cancel.clone(),
                remaining: Arc::clone(&remaining),
            };
            tokio::spawn(Self::run_job(Arc::clone(&self.shared), task));
        }

        Ok(BatchHandle { batch_id, job_ids })
    }

    /// Non-blocking snapshot of every job of a batch.
    pub async fn status(
        &self,
        batch_id: &BatchId,
    ) -> Result<BTreeMap<JobId, JobSnapshot>, EngineError> {
        let job_ids = self.job_ids_of(batch_id).await?;
        let jobs = self.shared.jobs.read().await;
        Ok(job_ids
            .into_iter()
            .filter_map(|id| jobs.get(&id).map(|job| (id, job.clone())))
            .collect())
    }

    /// Snapshot of a single job.
    pub async fn job(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.shared.jobs.read().await.get(job_id).cloned()
    }

    /// Waits until every job of the batch is terminal or `timeout` elapses.
    ///
    /// Jobs still unfinished at the deadline are reported as
    /// [`JobOutcome::Timeout`] and keep running.
    pub async fn await_batch(
        &self,
        batch_id: &BatchId,
        timeout: Duration,
    ) -> Result<BTreeMap<JobId, JobOutcome>, EngineError> {
        let mut remaining = {
            let batches = self.shared.batches.read().await;
            let record = batches
                .get(batch_id)
                .ok_or(EngineError::BatchNotFound(*batch_id))?;
            record.remaining.subscribe()
        };

        let timed_out = tokio::time::timeout(timeout, remaining.wait_for(|left| *left == 0))
            .await
            .is_err();
        if timed_out {
            debug!(batch_id = %batch_id, timeout_ms = timeout.as_millis() as u64, "Wait timed out");
        }

        let snapshot = self.status(batch_id).await?;
        Ok(snapshot
            .into_iter()
            .map(|(id, job)| (id, JobOutcome::from_job(&job)))
            .collect())
    }

    /// Requests cooperative cancellation of a batch.
    ///
    /// Returns how many jobs were not yet terminal. Pending jobs end as
    /// `Cancelled`; a job whose transcode is already in progress runs to
    /// completion.
    pub async fn cancel(&self, batch_id: &BatchId) -> Result<usize, EngineError> {
        let (job_ids, token) = {
            let batches = self.shared.batches.read().await;
            let record = batches
                .get(batch_id)
                .ok_or(EngineError::BatchNotFound(*batch_id))?;
            (record.job_ids.clone(), record.cancel.clone())
        };

        let unfinished = {
            let jobs = self.shared.jobs.read().await;
            job_ids
                .iter()
                .filter(|id| jobs.get(id).is_some_and(|job| !job.is_terminal()))
                .count()
        };
        token.cancel();

        info!(batch_id = %batch_id, unfinished, "Batch cancellation requested");
        Ok(unfinished)
    }

    /// Cancels every batch. Used on shutdown.
    pub async fn cancel_all(&self) {
        let batches = self.shared.batches.read().await;
        for record in batches.values() {
            record.cancel.cancel();
        }
    }

    /// Ids of all batches the engine still tracks.
    pub async fn batch_ids(&self) -> Vec<BatchId> {
        self.shared.batches.read().await.keys().copied().collect()
    }

    /// Per-state counts for every tracked batch, newest first.
    pub async fn batches(&self) -> Vec<BatchSummary> {
        let records: Vec<(BatchId, Vec<JobId>, String, String, DateTime<Utc>)> = {
            let batches = self.shared.batches.read().await;
            batches
                .iter()
                .map(|(id, record)| {
                    (
                        *id,
                        record.job_ids.clone(),
                        record.source_format.extension().to_string(),
                        record.target_format.extension().to_string(),
                        record.created_at,
                    )
                })
                .collect()
        };

        let jobs = self.shared.jobs.read().await;
        let mut summaries: Vec<BatchSummary> = records
            .into_iter()
            .map(|(batch_id, job_ids, source_format, target_format, created_at)| {
                let mut summary = BatchSummary {
                    batch_id,
                    source_format,
                    target_format,
                    created_at,
                    total: job_ids.len(),
                    pending: 0,
                    running: 0,
                    succeeded: 0,
                    failed: 0,
                    cancelled: 0,
                };
                for state in job_ids.iter().filter_map(|id| jobs.get(id)).map(|j| j.state()) {
                    match state {
                        JobState::Pending => summary.pending += 1,
                        JobState::Running => summary.running += 1,
                        JobState::Succeeded => summary.succeeded += 1,
                        JobState::Failed => summary.failed += 1,
                        JobState::Cancelled => summary.cancelled += 1,
                    }
                }
                summary
            })
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Returns the current pool status.
    pub fn pool_status(&self) -> PoolStatus {
        self.shared
            .stats
            .to_status(self.shared.config.max_concurrent_jobs.max(1))
    }

    /// Drops the records of a finished batch. Its artifacts stay in the
    /// store until their TTL elapses.
    pub async fn forget(&self, batch_id: &BatchId) -> Result<(), EngineError> {
        let job_ids = {
            let mut batches = self.shared.batches.write().await;
            let record = batches
                .get(batch_id)
                .ok_or(EngineError::BatchNotFound(*batch_id))?;
            if !record.is_finished() {
                return Err(EngineError::BatchInProgress(*batch_id));
            }
            batches
                .remove(batch_id)
                .map(|record| record.job_ids)
                .unwrap_or_default()
        };

        let mut jobs = self.shared.jobs.write().await;
        for id in &job_ids {
            jobs.remove(id);
        }
        debug!(batch_id = %batch_id, "Forgot batch");
        Ok(())
    }

    /// Forgets every finished batch submitted more than `older_than` ago.
    ///
    /// Returns how many batches were dropped.
    pub async fn prune_finished(&self, older_than: Duration) -> usize {
        let removed: Vec<BatchRecord> = {
            let mut batches = self.shared.batches.write().await;
            let stale: Vec<BatchId> = batches
                .iter()
                .filter(|(_, record)| {
                    record.is_finished() && record.submitted.elapsed() >= older_than
                })
                .map(|(id, _)| *id)
                .collect();
            stale
                .iter()
                .filter_map(|id| batches.remove(id))
                .collect()
        };

        if removed.is_empty() {
            return 0;
        }

        let mut jobs = self.shared.jobs.write().await;
        for record in &removed {
            for id in &record.job_ids {
                jobs.remove(id);
            }
        }
        debug!(count = removed.len(), "Pruned finished batches");
        removed.len()
    }

    /// Prunes finished batches older than the configured retention every
    /// `interval` until `cancel` fires.
    pub fn spawn_pruner(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            let retention = engine.config().batch_retention();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        engine.prune_finished(retention).await;
                    }
                }
            }
        })
    }

    async fn job_ids_of(&self, batch_id: &BatchId) -> Result<Vec<JobId>, EngineError> {
        let batches = self.shared.batches.read().await;
        batches
            .get(batch_id)
            .map(|record| record.job_ids.clone())
            .ok_or(EngineError::BatchNotFound(*batch_id))
    }

    /// Runs one job to a terminal state and signals the batch.
    async fn run_job(shared: Arc<Shared>, task: JobTask) {
        let job_id = task.job_id;
        let remaining = Arc::clone(&task.remaining);

        let (finish, permit) = Self::execute(&shared, task).await;
        shared.finish(job_id, finish).await;
        // Release the slot only once the job is terminal.
        drop(permit);

        remaining.send_modify(|left| *left = left.saturating_sub(1));
    }

    async fn execute(shared: &Shared, task: JobTask) -> (Finish, Option<OwnedSemaphorePermit>) {
        shared.stats.queued.fetch_add(1, Ordering::Relaxed);
        let permit = tokio::select! {
            biased;
            _ = task.cancel.cancelled() => None,
            permit = Arc::clone(&shared.semaphore).acquire_owned() => permit.ok(),
        };
        shared.stats.queued.fetch_sub(1, Ordering::Relaxed);

        let Some(permit) = permit else {
            return (Finish::Cancelled, None);
        };
        if task.cancel.is_cancelled() {
            return (Finish::Cancelled, Some(permit));
        }

        if let Err(e) = shared.start(task.job_id).await {
            warn!(job_id = %task.job_id, error = %e, "Could not start job");
            return (Finish::Cancelled, Some(permit));
        }

        let input = match task.file.content.read().await {
            Ok(input) => input,
            Err(e) => {
                let error = ConverterError::source_unreadable(&task.file.name, e);
                return (Finish::Failed(JobError::conversion(&error)), Some(permit));
            }
        };

        if task.cancel.is_cancelled() {
            return (Finish::Cancelled, Some(permit));
        }

        let finish = shared.transcode(&task, input).await;
        (finish, Some(permit))
    }
}

impl Shared {
    async fn start(&self, job_id: JobId) -> Result<(), crate::job::JobTransitionError> {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.start()?;
            self.stats.active.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn transcode(&self, task: &JobTask, input: Arc<[u8]>) -> Finish {
        let transcoder = match self.transcoders.select(&task.source, &task.target) {
            Ok(transcoder) => transcoder,
            Err(e) => {
                warn!(job_id = %task.job_id, error = %e, "No transcoder for job");
                return Finish::Failed(JobError::conversion(&e));
            }
        };

        let request = TranscodeRequest {
            job_id: task.job_id.to_string(),
            source_name: task.file.name.clone(),
            source: task.source.clone(),
            target: task.target.clone(),
            input,
        };
        let output_name = request.output_name();
        let timeout = self.config.job_timeout();

        debug!(
            job_id = %task.job_id,
            transcoder = transcoder.name(),
            source = %task.file.name,
            "Transcoding"
        );

        let started = Instant::now();
        let attempt = AssertUnwindSafe(transcoder.transcode(request)).catch_unwind();
        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(ConverterError::from_panic(&*panic)),
            Err(_) => Err(ConverterError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        };

        metrics::CONVERSION_DURATION
            .with_label_values(&[
                task.source.category().as_str(),
                if result.is_ok() { "success" } else { "failed" },
            ])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(output) => {
                let artifact = self
                    .store
                    .put(
                        task.job_id,
                        ArtifactPayload {
                            file_name: output_name,
                            target_format: task.target.clone(),
                            bytes: output.bytes,
                        },
                    )
                    .await;
                Finish::Succeeded(artifact.summary())
            }
            Err(e) => {
                warn!(
                    job_id = %task.job_id,
                    batch_id = %task.batch_id,
                    source = %task.file.name,
                    error = %e,
                    "Conversion failed"
                );
                Finish::Failed(JobError::conversion(&e))
            }
        }
    }

    async fn finish(&self, job_id: JobId, finish: Finish) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "Finished job is no longer tracked");
            return;
        };

        let was_running = job.state() == JobState::Running;
        let result = match finish {
            Finish::Succeeded(artifact) => job.succeed(artifact),
            Finish::Failed(error) => job.fail(error),
            Finish::Cancelled => job.cancel(),
        };

        if let Err(e) = result {
            warn!(error = %e, "Dropping job update");
            return;
        }

        if was_running {
            self.stats.active.fetch_sub(1, Ordering::Relaxed);
        }
        let counter = match job.state() {
            JobState::Succeeded => &self.stats.total_succeeded,
            JobState::Failed => &self.stats.total_failed,
            _ => &self.stats.total_cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::JOBS_FINISHED
            .with_label_values(&[job.state().as_str()])
            .inc();

        info!(
            job_id = %job_id,
            batch_id = %job.batch_id(),
            state = %job.state(),
            "Job finished"
        );
    }
}

/// Checks a batch before any job is created.
fn validate_batch(batch: &ConversionBatch) -> Result<(MediaFormat, MediaFormat), ValidationError> {
    if batch.files.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let source = MediaFormat::new(&batch.source_format);
    let target = MediaFormat::new(&batch.target_format);

    for file in &batch.files {
        let actual = detect_format(&file.name);
        if actual != source.extension() {
            return Err(ValidationError::SourceMismatch {
                file_name: file.name.clone(),
                expected: source.extension().to_string(),
                actual,
            });
        }
    }

    if !is_compatible(source.extension(), target.extension()) {
        return Err(ValidationError::IncompatibleTarget {
            source_format: source.extension().to_string(),
            target_format: target.extension().to_string(),
        });
    }

    Ok((source, target))
}
