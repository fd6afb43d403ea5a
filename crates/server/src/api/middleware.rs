//! Request metrics and authentication layers for the API router.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use convertino_core::{AuthError, Credentials, Identity};
use tracing::{debug, warn};

use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Decrements the in-flight gauge even if the inner service panics.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        HTTP_REQUESTS_IN_FLIGHT.inc();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        HTTP_REQUESTS_IN_FLIGHT.dec();
    }
}

/// Records duration and count of every request, labelled by method,
/// normalized path and status.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().as_str().to_owned();
    let path = normalize_path(request.uri().path());

    let response = {
        let _in_flight = InFlight::enter();
        next.run(request).await
    };

    let status = response.status().as_u16().to_string();
    let labels = [method.as_str(), path.as_str(), status.as_str()];
    HTTP_REQUEST_DURATION
        .with_label_values(&labels)
        .observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();

    response
}

/// Authenticates every API request and attaches the caller's [`Identity`].
///
/// Missing or wrong credentials yield 401; a misconfigured authenticator
/// yields 500.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let mut credentials = Credentials::from_headers(
        request
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
    );
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        credentials = credentials.with_peer(addr.ip());
    }

    let failure = match state.authenticator().authenticate(&credentials).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            return Ok(next.run(request).await);
        }
        Err(AuthError::MissingCredentials) => "missing_credentials",
        Err(AuthError::InvalidCredentials(reason)) => {
            debug!(peer = ?credentials.peer, "Rejected credentials: {}", reason);
            "invalid_credentials"
        }
        Err(AuthError::Misconfigured(reason)) => {
            warn!("Authenticator misconfigured: {}", reason);
            AUTH_FAILURES_TOTAL.with_label_values(&["misconfigured"]).inc();
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    AUTH_FAILURES_TOTAL.with_label_values(&[failure]).inc();
    Err(StatusCode::UNAUTHORIZED)
}

/// Extractor for the authenticated caller.
///
/// Falls back to the anonymous identity on routes outside the auth layer.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or_else(Identity::anonymous);
        std::future::ready(Ok(Caller(identity)))
    }
}
