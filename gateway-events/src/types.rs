//! Push event types
//!
//! This module defines the messages delivered over push connections and the
//! frame each message is wrapped in on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Event-type tag carried by every pushed frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PushEventType {
    /// Result of a dispatched message
    Response,
    /// Unsolicited notification (broadcasts)
    Notification,
    /// Failure of a dispatched message
    Error,
    /// Periodic keep-alive
    Heartbeat,
    /// Output of a tool invocation
    ToolResult,
    /// Connection lifecycle change
    ConnectionStatus,
}

impl PushEventType {
    /// Get the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushEventType::Response => "response",
            PushEventType::Notification => "notification",
            PushEventType::Error => "error",
            PushEventType::Heartbeat => "heartbeat",
            PushEventType::ToolResult => "tool-result",
            PushEventType::ConnectionStatus => "connection-status",
        }
    }

    /// Parse a wire tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "response" => Some(PushEventType::Response),
            "notification" => Some(PushEventType::Notification),
            "error" => Some(PushEventType::Error),
            "heartbeat" => Some(PushEventType::Heartbeat),
            "tool-result" => Some(PushEventType::ToolResult),
            "connection-status" => Some(PushEventType::ConnectionStatus),
            _ => None,
        }
    }
}

impl std::fmt::Display for PushEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message payload of a pushed event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushMessage {
    /// Event type, repeated inside the payload
    #[serde(rename = "type")]
    pub event_type: PushEventType,

    /// Successful result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// Extra context such as the correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl PushMessage {
    fn new(event_type: PushEventType) -> Self {
        Self {
            event_type,
            result: None,
            error: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// A message carrying a result under the given event type.
    pub fn with_result(event_type: PushEventType, result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::new(event_type)
        }
    }

    /// A `response` message.
    pub fn response(result: Value) -> Self {
        Self::with_result(PushEventType::Response, result)
    }

    /// A `notification` message.
    pub fn notification(payload: Value) -> Self {
        Self::with_result(PushEventType::Notification, payload)
    }

    /// An `error` message with the JSON-RPC style `{code, message}` body.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            error: Some(serde_json::json!({
                "code": code,
                "message": message.into(),
            })),
            ..Self::new(PushEventType::Error)
        }
    }

    /// A `heartbeat` message.
    pub fn heartbeat() -> Self {
        Self::new(PushEventType::Heartbeat)
    }

    /// A `connection-status` message.
    pub fn connection_status(status: &str, connection_id: &str) -> Self {
        Self::with_result(
            PushEventType::ConnectionStatus,
            serde_json::json!({
                "status": status,
                "connectionId": connection_id,
            }),
        )
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

/// One framed event as written to a push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PushFrame {
    /// Unique event id
    pub id: String,

    /// Event-type tag
    pub event: PushEventType,

    /// JSON-encoded `PushMessage`
    pub data: String,
}

impl PushFrame {
    /// Frame a message under a fresh event id.
    pub fn encode(message: &PushMessage) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::now_v7().to_string(),
            event: message.event_type,
            data: serde_json::to_string(message)?,
        })
    }

    /// Decode the payload back into a message.
    pub fn message(&self) -> Result<PushMessage, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}
