//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use gateway_auth::AuthManager;
use gateway_events::ConnectionRegistry;
use gateway_mcp::Dispatcher;

use crate::front::RateLimiter;

/// Components shared by every transport binding.
///
/// Each component is constructed once at startup and handed to the router;
/// handlers reach them only through this state.
#[derive(Clone)]
pub struct AppState {
    /// Credential store and verifier
    pub auth: Arc<AuthManager>,

    /// Live push connections
    pub registry: Arc<ConnectionRegistry>,

    /// Transport-agnostic MCP dispatcher
    pub dispatcher: Arc<Dispatcher>,

    /// Per-credential limiter, if enabled
    pub limiter: Option<RateLimiter>,
}

impl AppState {
    /// Bundle the components without rate limiting.
    pub fn new(
        auth: Arc<AuthManager>,
        registry: Arc<ConnectionRegistry>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            auth,
            registry,
            dispatcher,
            limiter: None,
        }
    }

    /// Enable fixed-window rate limiting.
    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.limiter = Some(RateLimiter::new(max_requests, window));
        self
    }
}
