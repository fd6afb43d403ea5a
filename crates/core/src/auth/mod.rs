//! Inbound request authentication.
//!
//! The method is chosen explicitly in configuration: `none` accepts every
//! request as anonymous (offline mode), `api_key` requires a shared key.
//! Authenticators only see [`Credentials`], which the server extracts from
//! request headers, so this module stays independent of the HTTP stack.

mod authenticators;
mod credentials;

pub use authenticators::{ApiKeyAuthenticator, NoneAuthenticator};
pub(crate) use authenticators::constant_time_eq;
pub use credentials::{Credentials, Identity};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No credentials presented")]
    MissingCredentials,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Authenticator misconfigured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Checks the presented credentials and names the caller.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    fn method(&self) -> AuthMethod;
}

/// Builds the authenticator selected by `[auth]`.
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::ApiKey => {
            let api_key = config
                .api_key
                .as_deref()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    AuthError::Misconfigured("auth.api_key is empty or missing".to_string())
                })?;
            Ok(Box::new(ApiKeyAuthenticator::new(api_key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_follows_config() {
        let auth = create_authenticator(&AuthConfig::none()).unwrap();
        assert_eq!(auth.method(), AuthMethod::None);

        let auth = create_authenticator(&AuthConfig::api_key("secret-key")).unwrap();
        assert_eq!(auth.method(), AuthMethod::ApiKey);
    }

    #[test]
    fn test_factory_rejects_missing_key() {
        let config = AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: None,
        };
        assert!(matches!(
            create_authenticator(&config),
            Err(AuthError::Misconfigured(_))
        ));
        assert!(matches!(
            create_authenticator(&AuthConfig::api_key("")),
            Err(AuthError::Misconfigured(_))
        ));
    }
}
