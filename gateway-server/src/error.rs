//! HTTP error mapping
//!
//! Every failure leaving the server is rendered as
//! `{"error": {"code": "...", "message": "..."}}` with a status chosen by
//! the error's origin.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_auth::AuthError;
use gateway_events::RegistryError;
use gateway_mcp::DispatchError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credential missing, invalid, or lacking a capability
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Dispatcher failure on the request/response binding
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Push channel could not be opened
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Too many requests in the current window
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Time until the window resets
        retry_after: Duration,
    },

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Dispatch(DispatchError::InsufficientPermissions(_)) => StatusCode::FORBIDDEN,
            ApiError::Dispatch(DispatchError::UnknownTool(_)) => StatusCode::NOT_FOUND,
            ApiError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Registry(RegistryError::ShutDown) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Registry(RegistryError::SinkClosed) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable error code for the response body.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.error_code(),
            ApiError::Dispatch(e) => e.error_code(),
            ApiError::Registry(RegistryError::ShutDown) => "SHUTTING_DOWN",
            ApiError::Registry(RegistryError::SinkClosed) => "CHANNEL_CLOSED",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "Request failed");
        } else {
            warn!(error = %self, code = self.error_code(), "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
