//! The `none` and `api_key` authentication methods.

use async_trait::async_trait;

use super::{AuthError, Authenticator, Credentials, Identity};
use crate::config::AuthMethod;

/// Offline mode: every request is anonymous.
///
/// Only built when `auth.method = "none"` is written in the config.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::None
    }
}

/// Accepts requests carrying the configured shared key, either as
/// `Authorization: Bearer <key>` or as `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    expected_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            expected_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let presented = credentials.key().ok_or(AuthError::MissingCredentials)?;

        // Either header form may hold the right key
        let matches = [credentials.bearer.as_deref(), credentials.api_key.as_deref()]
            .into_iter()
            .flatten()
            .any(|key| constant_time_eq(key.as_bytes(), self.expected_key.as_bytes()));

        if matches {
            Ok(Identity::api_client())
        } else {
            Err(AuthError::InvalidCredentials(format!(
                "API key of {} bytes does not match",
                presented.len()
            )))
        }
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::ApiKey
    }
}

/// Byte comparison whose running time depends only on the input length.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_auth() -> ApiKeyAuthenticator {
        ApiKeyAuthenticator::new("secret-key-123")
    }

    #[tokio::test]
    async fn test_none_is_anonymous() {
        let identity = NoneAuthenticator
            .authenticate(&Credentials::default())
            .await
            .unwrap();
        assert_eq!(identity, Identity::anonymous());
    }

    #[tokio::test]
    async fn test_bearer_key() {
        let credentials = Credentials::from_headers([("Authorization", "Bearer secret-key-123")]);
        let identity = key_auth().authenticate(&credentials).await.unwrap();
        assert_eq!(identity.client, "api_key_client");
        assert_eq!(identity.method, AuthMethod::ApiKey);
    }

    #[tokio::test]
    async fn test_x_api_key() {
        let credentials = Credentials::from_headers([("X-API-Key", "secret-key-123")]);
        assert!(key_auth().authenticate(&credentials).await.is_ok());
    }

    #[tokio::test]
    async fn test_bearer_scheme_case_insensitive() {
        for header in ["bearer secret-key-123", "BEARER secret-key-123"] {
            let credentials = Credentials::from_headers([("authorization", header)]);
            assert!(key_auth().authenticate(&credentials).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_wrong_bearer_with_right_header_key() {
        let credentials = Credentials::from_headers([
            ("Authorization", "Bearer wrong"),
            ("X-API-Key", "secret-key-123"),
        ]);
        assert!(key_auth().authenticate(&credentials).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_and_missing_key() {
        let credentials = Credentials::from_headers([("Authorization", "Bearer wrong-key")]);
        assert!(matches!(
            key_auth().authenticate(&credentials).await,
            Err(AuthError::InvalidCredentials(_))
        ));
        assert!(matches!(
            key_auth().authenticate(&Credentials::default()).await,
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
