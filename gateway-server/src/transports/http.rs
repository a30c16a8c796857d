//! Request/response binding: `POST /mcp`.
//!
//! One message in, one dispatcher call, one response out. A successful
//! result is returned as the response body itself.

use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use gateway_mcp::McpRequest;
use serde_json::Value;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::front::{Caller, RequestId};
use crate::state::AppState;

/// Handle one MCP message.
#[instrument(skip_all, fields(request_id = %request_id.as_str()))]
pub async fn handle(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request: McpRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid MCP message: {}", e)))?;

    let result = state
        .dispatcher
        .handle(&request, caller.record(), Some(request_id.as_str()))
        .await?;

    Ok(Json(result))
}
