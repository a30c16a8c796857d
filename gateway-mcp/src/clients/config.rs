//! Backend API configuration.
//!
//! Loaded from environment variables with defaults for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of the project-management REST backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL (e.g., "https://pm.example.com").
    pub base_url: String,

    /// API key sent as a bearer token.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum attempts for idempotent requests.
    pub max_retries: u32,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl BackendConfig {
    /// Create a configuration for the given base URL with default limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `BACKEND_API_URL`: base URL (default: http://localhost:4000)
    /// - `BACKEND_API_KEY`: API key
    /// - `BACKEND_TIMEOUT_SECS`: request timeout (default: 30)
    /// - `BACKEND_MAX_RETRIES`: attempts for GET requests (default: 3)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: std::env::var("BACKEND_API_URL").unwrap_or(default.base_url),
            api_key: std::env::var("BACKEND_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            timeout_secs: std::env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("BACKEND_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
        }
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
