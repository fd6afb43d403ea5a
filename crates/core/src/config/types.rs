use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::cloud::CloudConfig;
use crate::converter::ConverterConfig;
use crate::engine::EngineConfig;
use crate::store::StoreConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    /// Storage proxy for the cloud hand-off; disabled when absent.
    #[serde(default)]
    pub cloud: Option<CloudConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory that `POST /conversions` may read from. Batches of
    /// server-local paths are refused when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            source_dir: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    512 * 1024 * 1024 // 512 MiB
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// Explicit offline mode: every request is accepted as anonymous.
    pub fn none() -> Self {
        Self {
            method: AuthMethod::None,
            api_key: None,
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::ApiKey,
            api_key: Some(key.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: SanitizedServerConfig,
    pub engine: EngineConfig,
    pub store: StoreConfig,
    pub converter: SanitizedConverterConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<CloudConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

/// Server settings without filesystem details.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub local_sources_enabled: bool,
}

/// Converter settings without filesystem details.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConverterConfig {
    pub timeout_secs: u64,
    pub ffmpeg_log_level: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|key| !key.is_empty()),
            },
            server: SanitizedServerConfig {
                host: config.server.host,
                port: config.server.port,
                max_upload_bytes: config.server.max_upload_bytes,
                local_sources_enabled: config.server.source_dir.is_some(),
            },
            engine: config.engine.clone(),
            store: config.store.clone(),
            converter: SanitizedConverterConfig {
                timeout_secs: config.converter.timeout_secs,
                ffmpeg_log_level: config.converter.ffmpeg_log_level.clone(),
            },
            cloud: config.cloud.clone(),
        }
    }
}

impl Config {
    /// Minimal config for the given auth settings, everything else default.
    pub fn with_auth(auth: AuthConfig) -> Self {
        Self {
            auth,
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            store: StoreConfig::default(),
            converter: ConverterConfig::default(),
            cloud: None,
        }
    }
}
