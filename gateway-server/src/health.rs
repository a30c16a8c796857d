//! Liveness endpoint: `GET /health`.
//!
//! Unauthenticated. Reports the gateway's own state only; the backend is
//! not probed.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Accepting requests and push channels.
    Healthy,
    /// Shutting down; push channels are refused.
    Draining,
}

/// Health report body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Overall status
    pub status: HealthStatus,
    /// Gateway version
    pub version: String,
    /// Live push connections
    pub connections: usize,
    /// Stored credentials
    pub credentials: usize,
    /// Report time
    pub timestamp: DateTime<Utc>,
}

/// Report gateway health.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let status = if state.registry.is_shut_down() {
        HealthStatus::Draining
    } else {
        HealthStatus::Healthy
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Draining => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            connections: state.registry.len(),
            credentials: state.auth.len(),
            timestamp: Utc::now(),
        }),
    )
}
