//! Gateway front: credential extraction, correlation ids and rate limiting.
//!
//! Authentication happens here, before any dispatcher call. Handlers that
//! take a [`Caller`] never run for a missing or rejected credential.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::{FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use gateway_auth::{AuthError, CredentialRecord};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Correlation header, honoured on requests and echoed on responses.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Alternative credential header.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Identity used for unauthenticated requests.
const ANONYMOUS: &str = "anonymous";

/// Correlation id of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware assigning a correlation id to every request.
///
/// An incoming `X-Request-Id` is kept, otherwise a UUID v7 is generated.
/// The id is stored as a [`RequestId`] extension and echoed on the response.
pub async fn correlate(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

#[derive(serde::Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull the credential string from a request.
///
/// Precedence: `Authorization: Bearer`, then `X-Auth-Token`, then the
/// `token` query parameter.
pub fn credential_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let header_token = || {
        parts
            .headers
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    bearer
        .or_else(header_token)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .filter(|t| !t.is_empty())
        })
}

/// Fixed-window request counter per identity.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, (Instant, u32)>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// Allow `max_requests` per `window` for each identity.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    /// Count one request. Fails with the time left in the window when the
    /// budget is spent.
    pub fn check(&self, identity: &str) -> Result<(), Duration> {
        let mut entry = self
            .buckets
            .entry(identity.to_string())
            .or_insert_with(|| (Instant::now(), 0));
        let (window_start, count) = entry.value_mut();

        let elapsed = window_start.elapsed();
        if elapsed >= self.window {
            *window_start = Instant::now();
            *count = 1;
            return Ok(());
        }

        if *count >= self.max_requests {
            return Err(self.window - elapsed);
        }

        *count += 1;
        Ok(())
    }

    /// Drop buckets whose window has passed.
    pub fn prune(&self) {
        let window = self.window;
        self.buckets
            .retain(|_, (start, _)| start.elapsed() < window);
    }
}

fn limit(state: &AppState, identity: &str) -> ApiResult<()> {
    match &state.limiter {
        Some(limiter) => limiter
            .check(identity)
            .map_err(|retry_after| ApiError::RateLimited { retry_after }),
        None => Ok(()),
    }
}

/// A verified caller.
#[derive(Debug, Clone)]
pub struct Caller(pub CredentialRecord);

impl Caller {
    /// The caller's credential record.
    pub fn record(&self) -> &CredentialRecord {
        &self.0
    }

    /// Require the capabilities of an operation.
    ///
    /// The error names the operation, never the missing capability.
    pub fn require(&self, state: &AppState, operation: &str) -> ApiResult<()> {
        let required = state.dispatcher.operations().required(operation);
        if self.0.has_permission(required) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions(operation.to_string()).into())
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let Some(token) = credential_from_parts(parts) else {
            limit(state, ANONYMOUS)?;
            return Err(AuthError::AuthRequired.into());
        };

        let record = match state.auth.verify(&token).into_result() {
            Ok(record) => record,
            Err(e) => {
                limit(state, ANONYMOUS)?;
                return Err(e.into());
            }
        };

        limit(state, &record.id)?;
        debug!(credential_id = %record.id, kind = %record.kind, "Caller authenticated");
        Ok(Caller(record))
    }
}
