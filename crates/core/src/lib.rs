pub mod auth;
pub mod cloud;
pub mod config;
pub mod converter;
pub mod engine;
pub mod format;
pub mod job;
pub mod metrics;
pub mod store;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, Authenticator, Credentials, Identity,
    NoneAuthenticator,
};
pub use cloud::{
    AccessToken, CloudConfig, CloudError, CloudUploader, HttpCloudUploader, UploadReceipt,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, SanitizedConfig, ServerConfig, CONFIG_PATH_VAR,
};
pub use converter::{
    ConverterConfig, ConverterError, FfmpegTranscoder, TranscodeOutput, TranscodeRequest,
    Transcoder, TranscoderSet,
};
pub use engine::{
    BatchHandle, BatchSummary, ConversionBatch, ConversionEngine, EngineConfig, EngineError,
    JobOutcome, PoolStatus, ValidationError,
};
pub use format::{
    category_of, compatible_targets, detect_format, is_compatible, MediaCategory, MediaFormat,
};
pub use job::{
    BatchId, ContentHandle, ConversionJob, JobError, JobErrorKind, JobId, JobSnapshot, JobState,
    SourceError, SourceFile, SourceRoot,
};
pub use store::{
    ArtifactSummary, ResultArtifact, ResultStore, RetrievalHandle, StoreConfig, StoreError,
};
