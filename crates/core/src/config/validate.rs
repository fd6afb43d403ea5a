use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Rejects settings the service cannot run with:
/// - `api_key` auth without a key
/// - port 0
/// - an empty worker pool, zero job timeout or zero artifact TTL
/// - a relative `server.source_dir`
/// - a cloud base URL that is not http(s)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::invalid(
            "auth.api_key",
            "must be set when auth.method = \"api_key\"",
        ));
    }

    let zero_checks: [(&'static str, u64); 4] = [
        ("server.port", u64::from(config.server.port)),
        ("engine.max_concurrent_jobs", config.engine.max_concurrent_jobs as u64),
        ("engine.job_timeout_secs", config.engine.job_timeout_secs),
        ("store.ttl_secs", config.store.ttl_secs),
    ];
    if let Some((field, _)) = zero_checks.into_iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::invalid(field, "cannot be 0"));
    }

    if let Some(dir) = &config.server.source_dir {
        if !dir.is_absolute() {
            return Err(ConfigError::invalid(
                "server.source_dir",
                format!("must be an absolute path, got '{}'", dir.display()),
            ));
        }
    }

    if let Some(cloud) = &config.cloud {
        if !(cloud.base_url.starts_with("http://") || cloud.base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "cloud.base_url",
                format!("must be an http(s) URL, got '{}'", cloud.base_url),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::CloudConfig;
    use crate::config::AuthConfig;
    use tokio_test::{assert_err, assert_ok};

    fn valid() -> Config {
        Config::with_auth(AuthConfig::none())
    }

    fn assert_invalid(config: &Config, expected_field: &str) {
        let err = assert_err!(validate_config(config));
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, expected_field),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert_ok!(validate_config(&valid()));
        assert_ok!(validate_config(&Config::with_auth(AuthConfig::api_key("k"))));
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid();
        config.server.port = 0;
        assert_invalid(&config, "server.port");
    }

    #[test]
    fn test_validate_api_key_required() {
        let mut config = valid();
        config.auth.method = AuthMethod::ApiKey;
        assert_invalid(&config, "auth.api_key");

        config.auth.api_key = Some(String::new());
        assert_invalid(&config, "auth.api_key");
    }

    #[test]
    fn test_validate_zero_concurrency_and_ttl() {
        let mut config = valid();
        config.engine.max_concurrent_jobs = 0;
        assert_invalid(&config, "engine.max_concurrent_jobs");

        let mut config = valid();
        config.engine.job_timeout_secs = 0;
        assert_invalid(&config, "engine.job_timeout_secs");

        let mut config = valid();
        config.store.ttl_secs = 0;
        assert_invalid(&config, "store.ttl_secs");
    }

    #[test]
    fn test_validate_source_dir() {
        let mut config = valid();
        config.server.source_dir = Some("media".into());
        assert_invalid(&config, "server.source_dir");

        config.server.source_dir = Some(String::new().into());
        assert_invalid(&config, "server.source_dir");

        config.server.source_dir = Some("/srv/media".into());
        assert_ok!(validate_config(&config));
    }

    #[test]
    fn test_validate_cloud_url() {
        let mut config = valid();
        config.cloud = Some(CloudConfig::new("ftp://storage"));
        assert_invalid(&config, "cloud.base_url");

        config.cloud = Some(CloudConfig::new("https://storage.example.com/api"));
        assert_ok!(validate_config(&config));
    }
}
