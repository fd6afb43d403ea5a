//! What a caller presents and who it turns out to be.

use std::fmt;
use std::net::IpAddr;

use crate::config::AuthMethod;

/// Credentials pulled out of an inbound request.
///
/// Both header forms are captured; the bearer form wins when both carry a
/// key. Other `Authorization` schemes are ignored.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub bearer: Option<String>,
    pub api_key: Option<String>,
    pub peer: Option<IpAddr>,
}

impl Credentials {
    /// Collects credentials from `(name, value)` header pairs. Header names
    /// are matched case-insensitively.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut credentials = Self::default();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("authorization") {
                if let Some((scheme, token)) = value.split_once(' ') {
                    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
                        credentials.bearer = Some(token.trim().to_string());
                    }
                }
            } else if name.eq_ignore_ascii_case("x-api-key") && !value.trim().is_empty() {
                credentials.api_key = Some(value.trim().to_string());
            }
        }
        credentials
    }

    pub fn with_peer(mut self, peer: IpAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// The presented key, if any.
    pub fn key(&self) -> Option<&str> {
        self.bearer.as_deref().or(self.api_key.as_deref())
    }
}

/// Authenticated caller, attached to the request and logged with
/// submitted batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub client: String,
    pub method: AuthMethod,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            client: "anonymous".to_string(),
            method: AuthMethod::None,
        }
    }

    pub fn api_client() -> Self {
        Self {
            client: "api_key_client".to_string(),
            method: AuthMethod::ApiKey,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.client, self.method.as_str())
    }
}
