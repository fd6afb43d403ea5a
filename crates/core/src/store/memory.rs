//! In-memory result store with TTL eviction.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::StoreConfig;
use super::error::StoreError;
use super::types::{ArtifactPayload, ResultArtifact, RetrievalHandle};
use crate::auth::constant_time_eq;
use crate::format::mime_type;
use crate::job::JobId;
use crate::metrics;

struct Entry {
    artifact: Arc<ResultArtifact>,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    live: HashMap<JobId, Entry>,
    /// Evicted job ids and when they were evicted.
    tombstones: HashMap<JobId, Instant>,
}

/// Holds converted artifacts until their TTL elapses.
///
/// Writes come from engine workers (plus explicit `remove`), reads from API
/// callers. Expiry is measured from `put` on the tokio clock, so tests can
/// drive it with a paused runtime.
pub struct ResultStore {
    config: StoreConfig,
    secret: String,
    inner: RwLock<Inner>,
}

impl ResultStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            secret: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Stores the output of `job_id`, replacing any earlier artifact.
    pub async fn put(&self, job_id: JobId, payload: ArtifactPayload) -> Arc<ResultArtifact> {
        let ttl = self.config.ttl();
        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(52));

        let artifact = Arc::new(ResultArtifact {
            job_id,
            content_type: mime_type(payload.target_format.extension()),
            file_name: payload.file_name,
            target_format: payload.target_format,
            bytes: payload.bytes,
            created_at,
            retrieval: RetrievalHandle {
                token: self.sign(&job_id, expires_at.timestamp_millis()),
                expires_at,
            },
        });

        let mut inner = self.inner.write().await;
        inner.tombstones.remove(&job_id);
        inner.live.insert(
            job_id,
            Entry {
                artifact: Arc::clone(&artifact),
                expires_at: Instant::now() + ttl,
            },
        );

        metrics::ARTIFACTS_STORED.inc();
        metrics::ARTIFACTS_LIVE.set(inner.live.len() as i64);
        debug!(
            job_id = %job_id,
            file_name = %artifact.file_name,
            size_bytes = artifact.size_bytes(),
            "Stored artifact"
        );

        artifact
    }

    /// Returns the artifact of `job_id` while its TTL has not elapsed.
    pub async fn get(&self, job_id: &JobId) -> Result<Arc<ResultArtifact>, StoreError> {
        {
            let inner = self.inner.read().await;
            match inner.live.get(job_id) {
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Ok(Arc::clone(&entry.artifact));
                }
                Some(_) => {}
                None if inner.tombstones.contains_key(job_id) => {
                    return Err(StoreError::Expired(*job_id));
                }
                None => return Err(StoreError::NotFound(*job_id)),
            }
        }

        // Expired but not swept yet: evict it now.
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        match inner.live.get(job_id) {
            Some(entry) if now < entry.expires_at => Ok(Arc::clone(&entry.artifact)),
            Some(_) => {
                inner.live.remove(job_id);
                inner.tombstones.insert(*job_id, now);
                metrics::ARTIFACTS_EVICTED.inc();
                metrics::ARTIFACTS_LIVE.set(inner.live.len() as i64);
                Err(StoreError::Expired(*job_id))
            }
            None if inner.tombstones.contains_key(job_id) => Err(StoreError::Expired(*job_id)),
            None => Err(StoreError::NotFound(*job_id)),
        }
    }

    /// Like [`get`](Self::get), but also checks the retrieval token.
    pub async fn get_by_token(
        &self,
        job_id: &JobId,
        token: &str,
    ) -> Result<Arc<ResultArtifact>, StoreError> {
        let artifact = self.get(job_id).await?;
        if constant_time_eq(artifact.retrieval.token.as_bytes(), token.as_bytes()) {
            Ok(artifact)
        } else {
            Err(StoreError::InvalidHandle(*job_id))
        }
    }

    /// Removes an artifact. Later lookups report `NotFound`.
    pub async fn remove(&self, job_id: &JobId) -> Option<Arc<ResultArtifact>> {
        let mut inner = self.inner.write().await;
        inner.tombstones.remove(job_id);
        let removed = inner.live.remove(job_id).map(|entry| entry.artifact);
        metrics::ARTIFACTS_LIVE.set(inner.live.len() as i64);
        removed
    }

    /// Evicts every artifact whose TTL elapsed and forgets old tombstones.
    ///
    /// Returns how many artifacts were evicted.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let retention = self.config.tombstone_retention();
        let mut inner = self.inner.write().await;

        let expired: Vec<JobId> = inner
            .live
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(id, _)| *id)
            .collect();

        for job_id in &expired {
            inner.live.remove(job_id);
            inner.tombstones.insert(*job_id, now);
        }

        inner
            .tombstones
            .retain(|_, evicted_at| now.duration_since(*evicted_at) < retention);

        if !expired.is_empty() {
            metrics::ARTIFACTS_EVICTED.inc_by(expired.len() as u64);
            debug!(count = expired.len(), "Evicted expired artifacts");
        }
        metrics::ARTIFACTS_LIVE.set(inner.live.len() as i64);

        expired.len()
    }

    /// Number of artifacts currently retrievable or awaiting eviction.
    pub async fn len(&self) -> usize {
        self.inner.read().await.live.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Runs [`evict_expired`](Self::evict_expired) every `interval` until
    /// `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Artifact sweeper started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        store.evict_expired().await;
                    }
                }
            }
            info!("Artifact sweeper stopped");
        })
    }

    fn sign(&self, job_id: &JobId, expires_at_ms: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(job_id.as_uuid().as_bytes());
        hasher.update(expires_at_ms.to_be_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MediaFormat;

    fn payload(name: &str) -> ArtifactPayload {
        ArtifactPayload {
            file_name: name.to_string(),
            target_format: MediaFormat::new("wav"),
            bytes: b"RIFF".to_vec(),
        }
    }

    fn store_with_ttl(ttl_secs: u64) -> Arc<ResultStore> {
        Arc::new(ResultStore::new(StoreConfig::default().with_ttl(ttl_secs)))
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_artifact() {
        let store = store_with_ttl(60);
        let job_id = JobId::new();
        store.put(job_id, payload("a.wav")).await;

        let first = store.get(&job_id).await.unwrap();
        let second = store.get(&job_id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.file_name, "a.wav");
        assert_eq!(first.content_type, "audio/wav");
        assert_eq!(first.size_bytes(), 4);
    }

    #[tokio::test]
    async fn test_unknown_job_not_found() {
        let store = store_with_ttl(60);
        let job_id = JobId::new();
        assert_eq!(
            store.get(&job_id).await.unwrap_err(),
            StoreError::NotFound(job_id)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_ttl_is_expired() {
        let store = store_with_ttl(10);
        let job_id = JobId::new();
        store.put(job_id, payload("a.wav")).await;

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get(&job_id).await.is_ok());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            store.get(&job_id).await.unwrap_err(),
            StoreError::Expired(job_id)
        );
        // Still expired, not forgotten.
        assert_eq!(
            store.get(&job_id).await.unwrap_err(),
            StoreError::Expired(job_id)
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired_and_tombstone_retention() {
        let config = StoreConfig {
            ttl_secs: 5,
            sweep_interval_secs: 1,
            tombstone_retention_secs: 100,
        };
        let store = ResultStore::new(config);
        let old = JobId::new();
        store.put(old, payload("old.wav")).await;

        tokio::time::advance(Duration::from_secs(3)).await;
        let fresh = JobId::new();
        store.put(fresh, payload("fresh.wav")).await;

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(store.evict_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&old).await.unwrap_err(), StoreError::Expired(old));
        assert!(store.get(&fresh).await.is_ok());

        tokio::time::advance(Duration::from_secs(101)).await;
        store.evict_expired().await;
        assert_eq!(store.get(&old).await.unwrap_err(), StoreError::NotFound(old));
    }

    #[tokio::test]
    async fn test_token_validation() {
        let store = store_with_ttl(60);
        let job_id = JobId::new();
        let artifact = store.put(job_id, payload("a.wav")).await;
        let token = artifact.retrieval.token.clone();

        assert_eq!(token.len(), 64);
        assert!(store.get_by_token(&job_id, &token).await.is_ok());
        assert_eq!(
            store.get_by_token(&job_id, "forged").await.unwrap_err(),
            StoreError::InvalidHandle(job_id)
        );
    }

    #[tokio::test]
    async fn test_tokens_differ_between_stores() {
        let job_id = JobId::new();
        let a = store_with_ttl(60).put(job_id, payload("a.wav")).await;
        let b = store_with_ttl(60).put(job_id, payload("a.wav")).await;
        assert_ne!(a.retrieval.token, b.retrieval.token);
    }

    #[tokio::test]
    async fn test_put_is_last_write_wins() {
        let store = store_with_ttl(60);
        let job_id = JobId::new();
        store.put(job_id, payload("first.wav")).await;
        store.put(job_id, payload("second.wav")).await;

        assert_eq!(store.get(&job_id).await.unwrap().file_name, "second.wav");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store_with_ttl(60);
        let job_id = JobId::new();
        store.put(job_id, payload("a.wav")).await;

        assert!(store.remove(&job_id).await.is_some());
        assert!(store.remove(&job_id).await.is_none());
        assert_eq!(
            store.get(&job_id).await.unwrap_err(),
            StoreError::NotFound(job_id)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let store = store_with_ttl(2);
        let job_id = JobId::new();
        store.put(job_id, payload("a.wav")).await;

        let cancel = CancellationToken::new();
        let handle = store.spawn_sweeper(Duration::from_secs(1), cancel.clone());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(store.is_empty().await);

        cancel.cancel();
        handle.await.unwrap();
    }
}
