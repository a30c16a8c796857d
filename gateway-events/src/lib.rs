//! # Gateway Events
//!
//! Push-connection management for the MCP gateway.
//!
//! ## Overview
//!
//! - **Types**: Event-type tags, message payloads and wire frames
//! - **Sinks**: The write half of a push channel
//! - **Registry**: Live connections, unicast and broadcast delivery,
//!   heartbeat and staleness eviction
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use gateway_auth::{AuthConfig, AuthManager};
//! use gateway_events::{ChannelSink, ClientMeta, ConnectionRegistry, PushMessage, RegistryConfig};
//! use gateway_rbac::CredentialKind;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let auth = AuthManager::new(AuthConfig::new("a-secret-of-at-least-16-bytes")).unwrap();
//! let issued = auth.issue(CredentialKind::Team, None, None).unwrap();
//!
//! let registry = ConnectionRegistry::start(RegistryConfig::default());
//! let (sink, mut frames) = ChannelSink::channel();
//! let guard = registry
//!     .register(Arc::new(sink), issued.record, ClientMeta::default())
//!     .unwrap();
//!
//! assert!(registry.send(guard.id(), &PushMessage::notification("hello".into())));
//! assert_eq!(frames.recv().await.unwrap().event.as_str(), "connection-status");
//! assert_eq!(frames.recv().await.unwrap().event.as_str(), "notification");
//!
//! registry.shutdown();
//! # }
//! ```

pub mod registry;
pub mod sink;
pub mod types;

pub use registry::{
    capability_filter, kind_filter, ClientMeta, ConnectionGuard, ConnectionRegistry,
    PushConnection, RegistryConfig, RegistryError, RegistryResult, RegistryStats,
};
pub use sink::{ChannelSink, EventSink, SinkError, DEFAULT_SINK_CAPACITY};
pub use types::{PushEventType, PushFrame, PushMessage};
