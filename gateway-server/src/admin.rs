//! Token administration: `/admin/tokens`.
//!
//! Issue, revoke and list credentials. Every route requires the
//! `tokens:manage` capability. Listings never include credential strings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use gateway_auth::CredentialRecord;
use gateway_rbac::{CredentialKind, OP_ISSUE_TOKEN, OP_LIST_TOKENS, OP_REVOKE_TOKEN};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::front::Caller;
use crate::state::AppState;

/// Body of `POST /admin/tokens`.
#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    /// Kind of the new credential
    pub kind: CredentialKind,
    /// Lifetime such as `30m` or `7d`; omitted means no expiry
    #[serde(default)]
    pub ttl: Option<String>,
    /// Free-form label
    #[serde(default)]
    pub description: Option<String>,
}

/// Reply of `POST /admin/tokens`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    /// The credential string, shown only here
    pub token: String,
    /// Record id, usable in logs
    pub id: String,
    /// Kind granted
    pub kind: CredentialKind,
    /// Expiry, if any
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issue a credential.
pub async fn issue(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<IssueRequest>,
) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
    caller.require(&state, OP_ISSUE_TOKEN)?;

    let issued = state
        .auth
        .issue(body.kind, body.ttl.as_deref(), body.description)?;
    info!(
        issued_by = %caller.record().id,
        credential_id = %issued.record.id,
        kind = %issued.record.kind,
        "Credential issued over admin API"
    );

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            token: issued.token,
            id: issued.record.id,
            kind: issued.record.kind,
            expires_at: issued.record.expires_at,
        }),
    ))
}

/// Body of `DELETE /admin/tokens`.
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    /// Credential string to revoke
    pub token: String,
}

/// Reply of `DELETE /admin/tokens`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevokeResponse {
    /// Whether a stored record was removed
    pub revoked: bool,
}

/// Revoke a credential.
pub async fn revoke(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<RevokeRequest>,
) -> ApiResult<Json<RevokeResponse>> {
    caller.require(&state, OP_REVOKE_TOKEN)?;

    let revoked = state.auth.revoke(&body.token);
    info!(revoked_by = %caller.record().id, revoked, "Credential revoked over admin API");
    Ok(Json(RevokeResponse { revoked }))
}

/// List live credentials.
pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<CredentialRecord>>> {
    caller.require(&state, OP_LIST_TOKENS)?;
    Ok(Json(state.auth.list()))
}
