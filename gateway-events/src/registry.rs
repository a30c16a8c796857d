//! Push-connection registry
//!
//! Tracks every open push channel together with the credential that opened
//! it, delivers unicast and broadcast events, and runs the heartbeat and
//! staleness background tasks.
//!
//! All map mutations happen under a short synchronous lock. Sinks are written
//! and closed outside of it.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use gateway_auth::CredentialRecord;
use gateway_rbac::CredentialKind;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sink::EventSink;
use crate::types::{PushFrame, PushMessage};

/// Registry error types.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry has been shut down
    #[error("Connection registry is shut down")]
    ShutDown,

    /// The sink closed before the connection was established
    #[error("Push channel closed during registration")]
    SinkClosed,
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Timing of the background tasks.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Interval between heartbeat broadcasts
    pub heartbeat_interval: Duration,

    /// Interval between staleness sweeps
    pub sweep_interval: Duration,

    /// Inactivity after which a connection is evicted
    pub stale_after: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(60),
            stale_after: Duration::from_secs(5 * 60),
        }
    }
}

/// Client details captured when a channel opens.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMeta {
    /// User-Agent header, if sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Peer address, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,

    /// Correlation id of the opening request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// One live push connection.
pub struct PushConnection {
    /// Connection id
    pub id: String,

    /// Credential active when the channel opened
    pub credential: CredentialRecord,

    /// Client details
    pub meta: ClientMeta,

    /// Wall-clock open time
    pub connected_at: DateTime<Utc>,

    last_activity: Instant,
    sink: Arc<dyn EventSink>,
}

impl PushConnection {
    /// Time of the last successful write.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}

impl std::fmt::Debug for PushConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConnection")
            .field("id", &self.id)
            .field("credential_id", &self.credential.id)
            .field("kind", &self.credential.kind)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

/// Connection counts and age bounds.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Live connections
    pub total: usize,

    /// Live connections per credential kind
    pub by_kind: BTreeMap<CredentialKind, usize>,

    /// Open time of the oldest connection
    pub oldest_connected_at: Option<DateTime<Utc>>,

    /// Open time of the newest connection
    pub newest_connected_at: Option<DateTime<Utc>>,
}

/// Predicate matching connections whose credential kind is listed.
pub fn kind_filter(kinds: Vec<CredentialKind>) -> impl Fn(&PushConnection) -> bool {
    move |conn| kinds.contains(&conn.credential.kind)
}

/// Predicate matching connections holding every listed capability.
pub fn capability_filter(required: Vec<String>) -> impl Fn(&PushConnection) -> bool {
    move |conn| conn.credential.has_permission(&required)
}

/// Unregisters its connection when dropped.
///
/// The push transport holds this for as long as it streams the channel, so
/// a client disconnect or stream error removes the entry.
#[must_use = "dropping the guard unregisters the connection"]
#[derive(Debug)]
pub struct ConnectionGuard {
    id: String,
    registry: Weak<ConnectionRegistry>,
}

impl ConnectionGuard {
    /// The connection id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.id);
        }
    }
}

/// Registry of live push connections.
pub struct ConnectionRegistry {
    config: RegistryConfig,
    connections: RwLock<HashMap<String, PushConnection>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("config", &self.config)
            .field("connections", &self.connections.read().len())
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .finish()
    }
}

impl ConnectionRegistry {
    /// Create a registry without background tasks.
    pub fn new(config: RegistryConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            connections: RwLock::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Create a registry and start the heartbeat and staleness tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: RegistryConfig) -> Arc<Self> {
        let registry = Self::new(config);
        let heartbeat = registry.spawn_heartbeat();
        let sweeper = registry.spawn_sweeper();
        registry.tasks.lock().extend([heartbeat, sweeper]);
        registry
    }

    /// The active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a newly opened channel.
    ///
    /// Sends a `connection-status` event before returning. The returned
    /// guard unregisters the connection when dropped.
    pub fn register(
        self: &Arc<Self>,
        sink: Arc<dyn EventSink>,
        credential: CredentialRecord,
        meta: ClientMeta,
    ) -> RegistryResult<ConnectionGuard> {
        if self.is_shut_down() {
            sink.close();
            return Err(RegistryError::ShutDown);
        }

        let id = Uuid::now_v7().to_string();
        let connection = PushConnection {
            id: id.clone(),
            credential,
            meta,
            connected_at: Utc::now(),
            last_activity: Instant::now(),
            sink,
        };

        info!(
            connection_id = %id,
            credential_id = %connection.credential.id,
            kind = %connection.credential.kind,
            "Push connection registered"
        );
        self.connections.write().insert(id.clone(), connection);

        let guard = ConnectionGuard {
            id: id.clone(),
            registry: Arc::downgrade(self),
        };

        if !self.send(&id, &PushMessage::connection_status("connected", &id)) {
            return Err(RegistryError::SinkClosed);
        }

        Ok(guard)
    }

    /// Remove a connection and close its sink. Unknown ids are ignored.
    pub fn unregister(&self, connection_id: &str) {
        let removed = self.connections.write().remove(connection_id);

        if let Some(connection) = removed {
            if !connection.sink.is_closed() {
                connection.sink.close();
            }
            info!(connection_id = %connection_id, "Push connection unregistered");
        }
    }

    /// Deliver one message to one connection.
    ///
    /// Returns `false` for unknown ids. A failed write unregisters the
    /// connection and also returns `false`.
    pub fn send(&self, connection_id: &str, message: &PushMessage) -> bool {
        let frame = match PushFrame::encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode push message");
                return false;
            }
        };

        let sink = match self.connections.read().get(connection_id) {
            Some(connection) => connection.sink.clone(),
            None => return false,
        };

        match sink.write(frame) {
            Ok(()) => {
                if let Some(connection) = self.connections.write().get_mut(connection_id) {
                    connection.last_activity = Instant::now();
                }
                true
            }
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "Push write failed");
                self.unregister(connection_id);
                false
            }
        }
    }

    /// Deliver a message to every connection matching `predicate`.
    ///
    /// Returns the number of successful deliveries.
    pub fn broadcast<F>(&self, message: &PushMessage, predicate: F) -> usize
    where
        F: Fn(&PushConnection) -> bool,
    {
        let targets: Vec<String> = self
            .connections
            .read()
            .values()
            .filter(|conn| predicate(conn))
            .map(|conn| conn.id.clone())
            .collect();

        let delivered = targets
            .iter()
            .filter(|id| self.send(id, message))
            .count();

        debug!(
            event = %message.event_type,
            targets = targets.len(),
            delivered,
            "Broadcast complete"
        );
        delivered
    }

    /// Deliver a message to every connection.
    pub fn broadcast_all(&self, message: &PushMessage) -> usize {
        self.broadcast(message, |_| true)
    }

    /// Snapshot of connection counts.
    pub fn stats(&self) -> RegistryStats {
        let connections = self.connections.read();
        let mut stats = RegistryStats {
            total: connections.len(),
            ..Default::default()
        };

        for conn in connections.values() {
            *stats.by_kind.entry(conn.credential.kind).or_insert(0) += 1;
            stats.oldest_connected_at = Some(match stats.oldest_connected_at {
                Some(t) if t <= conn.connected_at => t,
                _ => conn.connected_at,
            });
            stats.newest_connected_at = Some(match stats.newest_connected_at {
                Some(t) if t >= conn.connected_at => t,
                _ => conn.connected_at,
            });
        }

        stats
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Check if no connection is live.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Check if a connection is live.
    pub fn contains(&self, connection_id: &str) -> bool {
        self.connections.read().contains_key(connection_id)
    }

    /// Id of the credential a connection was opened with.
    pub fn owner(&self, connection_id: &str) -> Option<String> {
        self.connections
            .read()
            .get(connection_id)
            .map(|conn| conn.credential.id.clone())
    }

    /// Send a heartbeat to every connection.
    pub fn heartbeat(&self) -> usize {
        self.broadcast_all(&PushMessage::heartbeat())
    }

    /// Unregister every connection idle for longer than the threshold.
    ///
    /// Returns the number of evicted connections.
    pub fn sweep_stale(&self) -> usize {
        let now = Instant::now();
        let stale: Vec<String> = self
            .connections
            .read()
            .values()
            .filter(|conn| now.saturating_duration_since(conn.last_activity) > self.config.stale_after)
            .map(|conn| conn.id.clone())
            .collect();

        for id in &stale {
            info!(connection_id = %id, "Evicting stale push connection");
            self.unregister(id);
        }
        stale.len()
    }

    /// Stop background tasks and unregister every connection.
    ///
    /// The registry rejects new registrations afterwards.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        for task in self.tasks.lock().drain(..) {
            task.abort();
        }

        let ids: Vec<String> = self.connections.read().keys().cloned().collect();
        for id in &ids {
            self.unregister(id);
        }

        info!(closed = ids.len(), "Connection registry shut down");
    }

    /// Check if `shutdown` has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn spawn_heartbeat(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = self.config.heartbeat_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(registry) = weak.upgrade() else { break };
                let delivered = registry.heartbeat();
                debug!(delivered, "Heartbeat sent");
            }
        })
    }

    fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(registry) = weak.upgrade() else { break };
                registry.sweep_stale();
            }
        })
    }
}

impl Drop for ConnectionRegistry {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
