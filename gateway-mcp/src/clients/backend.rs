//! Project-management backend client.
//!
//! Thin HTTP wrapper around the backend's REST endpoints. Every method
//! returns the decoded JSON body; `GET`s are retried on transient failures.

use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use super::config::BackendConfig;
use crate::retry::{with_retry_if, RetryConfig};

/// Backend client errors.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the API key.
    #[error("Backend authentication failed")]
    AuthenticationFailed,

    /// Response body was not the expected JSON.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Check if the failure is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            BackendError::ApiError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Fields for a new project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProject {
    /// Project name.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields for a new user story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    /// Story title.
    pub title: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional acceptance criteria.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
}

/// Backend REST client.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
    retry: RetryConfig,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish()
    }
}

impl BackendClient {
    /// Create a client from configuration.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let retry = RetryConfig::with_attempts(config.max_retries);

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// List all projects.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Value, BackendError> {
        self.get("/api/projects").await
    }

    /// Fetch one project.
    #[instrument(skip(self))]
    pub async fn get_project(&self, project_id: &str) -> Result<Value, BackendError> {
        self.get(&format!("/api/projects/{}", project_id)).await
    }

    /// Create a project.
    #[instrument(skip(self, project), fields(name = %project.name))]
    pub async fn create_project(&self, project: &NewProject) -> Result<Value, BackendError> {
        self.send(Method::POST, "/api/projects", project).await
    }

    /// List the stories of a project.
    #[instrument(skip(self))]
    pub async fn list_stories(&self, project_id: &str) -> Result<Value, BackendError> {
        self.get(&format!("/api/projects/{}/stories", project_id))
            .await
    }

    /// Create a story in a project.
    #[instrument(skip(self, story), fields(title = %story.title))]
    pub async fn create_story(
        &self,
        project_id: &str,
        story: &NewStory,
    ) -> Result<Value, BackendError> {
        self.send(
            Method::POST,
            &format!("/api/projects/{}/stories", project_id),
            story,
        )
        .await
    }

    async fn get(&self, path: &str) -> Result<Value, BackendError> {
        let url = self.config.url(path);
        with_retry_if(
            &self.retry,
            || self.execute(self.request(Method::GET, &url), path),
            BackendError::is_retryable,
        )
        .await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let url = self.config.url(path);
        self.execute(self.request(method, &url).json(body), path)
            .await
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(ref api_key) = self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        request
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Value, BackendError> {
        debug!(path, "Calling backend");
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!(path, "Backend authentication failed");
            return Err(BackendError::AuthenticationFailed);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(path, status = status.as_u16(), "Backend API error");
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
