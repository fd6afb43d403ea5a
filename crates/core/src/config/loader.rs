use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variable overrides, e.g. `CONVERTINO_SERVER__PORT`.
pub const ENV_PREFIX: &str = "CONVERTINO_";

/// Variable naming the config file. Shares the override prefix, so it is
/// excluded from the overrides.
pub const CONFIG_PATH_VAR: &str = "CONVERTINO_CONFIG";

/// Reads `path` and applies `CONVERTINO_*` overrides on top.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let overrides = Env::prefixed(ENV_PREFIX)
        .split("__")
        .ignore(&[CONFIG_PATH_VAR.trim_start_matches(ENV_PREFIX)]);

    Figment::new()
        .merge(Toml::file(path))
        .merge(overrides)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parses a TOML document without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
