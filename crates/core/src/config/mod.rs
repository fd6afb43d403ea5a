//! Service configuration.
//!
//! A TOML file (path from `CONVERTINO_CONFIG`) overlaid with
//! `CONVERTINO_<SECTION>__<KEY>` environment variables. `[auth]` is the only
//! required section: offline mode has to be chosen explicitly.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str, CONFIG_PATH_VAR, ENV_PREFIX};
pub use types::{
    AuthConfig, AuthMethod, Config, SanitizedAuthConfig, SanitizedConfig,
    SanitizedConverterConfig, SanitizedServerConfig, ServerConfig,
};
pub use validate::validate_config;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
