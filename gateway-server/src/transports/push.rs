//! Push binding over server-sent events.
//!
//! `GET /sse` opens a channel and registers it with the connection
//! registry. Messages for a channel arrive on `POST /sse/message`; the
//! dispatcher's answer is pushed to the channel while the POST itself only
//! reports whether the push went through.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, Sse};
use axum::{Extension, Json};
use futures::Stream;
use gateway_events::{
    capability_filter, kind_filter, ChannelSink, ClientMeta, PushConnection, PushEventType,
    PushFrame, PushMessage, RegistryStats,
};
use gateway_mcp::McpRequest;
use gateway_rbac::{CredentialKind, OP_BROADCAST, OP_CONNECTION_STATS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::front::{Caller, RequestId};
use crate::state::AppState;

fn to_event(frame: PushFrame) -> Event {
    Event::default()
        .id(frame.id)
        .event(frame.event.as_str())
        .data(frame.data)
}

/// Open a push channel.
///
/// The registry's guard lives inside the response stream, so the
/// connection is unregistered as soon as the client goes away.
pub async fn open(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let meta = ClientMeta {
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        remote_addr: peer.map(|ConnectInfo(addr)| addr.to_string()),
        request_id: Some(request_id.0),
    };

    let (sink, mut frames) = ChannelSink::channel();
    let guard = state.registry.register(Arc::new(sink), caller.0, meta)?;
    info!(connection_id = %guard.id(), "Push channel opened");

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(frame) = frames.recv().await {
            yield Ok(to_event(frame));
        }
    };

    Ok(Sse::new(stream))
}

/// Body of `POST /sse/message`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    /// Target connection
    pub connection_id: String,
    /// MCP message, or an arbitrary payload pushed as a notification
    pub message: Value,
}

/// Reply of `POST /sse/message`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendOutcome {
    /// Whether the event reached the connection
    pub sent: bool,
}

/// Route a message to a push channel.
pub async fn message(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Json(body): Json<ChannelMessage>,
) -> ApiResult<Json<SendOutcome>> {
    // Channels of other credentials look the same as unknown ones.
    match state.registry.owner(&body.connection_id) {
        Some(owner) if owner == caller.record().id => {}
        Some(_) => {
            debug!(connection_id = %body.connection_id, "Message for a foreign connection");
            return Ok(Json(SendOutcome { sent: false }));
        }
        None => {
            debug!(connection_id = %body.connection_id, "Message for unknown connection");
            return Ok(Json(SendOutcome { sent: false }));
        }
    }

    let has_method = body.message.get("method").map_or(false, Value::is_string);
    let push = if has_method {
        let request: McpRequest = serde_json::from_value(body.message)
            .map_err(|e| ApiError::BadRequest(format!("invalid MCP message: {}", e)))?;

        let reply = match state
            .dispatcher
            .handle(&request, caller.record(), Some(request_id.as_str()))
            .await
        {
            Ok(result) => PushMessage::response(result),
            Err(e) => PushMessage::error(e.rpc_code(), e.to_string()),
        };

        match request.id {
            Some(id) => reply.with_metadata("id", json!(id)),
            None => reply,
        }
    } else {
        PushMessage::notification(body.message)
    };

    let sent = state
        .registry
        .send(&body.connection_id, &push.with_metadata("requestId", json!(request_id.0)));
    Ok(Json(SendOutcome { sent }))
}

/// Body of `POST /sse/broadcast`.
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    /// Payload pushed to every matching connection
    pub event: Value,

    /// Event-type tag (default `notification`)
    #[serde(default, rename = "type")]
    pub event_type: Option<PushEventType>,

    /// Restrict to these credential kinds
    #[serde(default)]
    pub kinds: Option<Vec<CredentialKind>>,

    /// Restrict to connections holding all these capabilities
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
}

/// Reply of `POST /sse/broadcast`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Connections the event reached
    pub delivered: usize,
}

/// Push an event to all or a filtered subset of connections.
pub async fn broadcast(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<BroadcastRequest>,
) -> ApiResult<Json<BroadcastOutcome>> {
    caller.require(&state, OP_BROADCAST)?;

    let event_type = body.event_type.unwrap_or(PushEventType::Notification);
    let message = PushMessage::with_result(event_type, body.event);

    let by_kind = body.kinds.map(kind_filter);
    let by_capability = body.capabilities.map(capability_filter);
    let delivered = state.registry.broadcast(&message, |connection: &PushConnection| {
        by_kind.as_ref().map_or(true, |f| f(connection))
            && by_capability.as_ref().map_or(true, |f| f(connection))
    });

    info!(
        credential_id = %caller.record().id,
        event = %event_type,
        delivered,
        "Broadcast sent"
    );
    Ok(Json(BroadcastOutcome { delivered }))
}

/// Registry statistics.
pub async fn stats(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<RegistryStats>> {
    caller.require(&state, OP_CONNECTION_STATS)?;
    Ok(Json(state.registry.stats()))
}
