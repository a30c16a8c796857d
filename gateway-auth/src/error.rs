//! Error types for authentication operations
//!
//! This module defines all error types that can occur while issuing,
//! verifying and authorizing gateway credentials.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed ttl syntax (caller error)
    #[error("Invalid duration '{0}': expected <integer><s|m|h|d>")]
    InvalidDuration(String),

    /// No credential was presented
    #[error("Authentication required")]
    AuthRequired,

    /// Credential is absent from the store, expired, revoked or malformed
    #[error("Invalid or expired credential")]
    AuthInvalid,

    /// Valid credential without the capabilities for an operation
    #[error("Insufficient permissions for {0}")]
    InsufficientPermissions(String),

    /// Signed token could not be decoded or has a bad signature
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Signed token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token could not be signed
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Rejected credentials are expected traffic and are not server errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Signing(_) | AuthError::ConfigError(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidDuration(_) => 400,

            AuthError::AuthRequired
            | AuthError::AuthInvalid
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired => 401,

            AuthError::InsufficientPermissions(_) => 403,

            AuthError::Signing(_) | AuthError::ConfigError(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidDuration(_) => "INVALID_DURATION",
            AuthError::AuthRequired => "AUTH_REQUIRED",
            AuthError::AuthInvalid => "AUTH_INVALID",
            AuthError::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::Signing(_) => "SIGNING_ERROR",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}
