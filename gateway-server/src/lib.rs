//! # Gateway Server
//!
//! HTTP front of the MCP gateway.
//!
//! ## Overview
//!
//! The gateway-server crate wires the gateway components behind axum:
//! - **Front**: Credential extraction, correlation ids, rate limiting
//! - **Transports**: Request/response, server-sent events and NDJSON streaming
//! - **Admin**: Token issuance, revocation and listing
//! - **Health**: Unauthenticated liveness report
//!
//! ## Routes
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | POST | `/mcp` | One message, one response |
//! | GET | `/sse` | Open a push channel |
//! | POST | `/sse/message` | Dispatch a message to a push channel |
//! | POST | `/sse/broadcast` | Push an event to many channels |
//! | GET | `/sse/stats` | Push channel statistics |
//! | POST | `/mcp/stream` | Newline-delimited JSON streaming |
//! | POST/GET/DELETE | `/admin/tokens` | Token administration |
//! | GET | `/health` | Liveness |

pub mod admin;
pub mod config;
pub mod error;
pub mod front;
pub mod health;
pub mod state;
pub mod transports;

pub use config::{Args, LogFormat, StaticToken};
pub use error::{ApiError, ApiResult};
pub use front::{Caller, RateLimiter, RequestId};
pub use state::AppState;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(transports::http::handle))
        .route("/mcp/stream", post(transports::stream::handle))
        .route("/sse", get(transports::push::open))
        .route("/sse/message", post(transports::push::message))
        .route("/sse/broadcast", post(transports::push::broadcast))
        .route("/sse/stats", get(transports::push::stats))
        .route(
            "/admin/tokens",
            post(admin::issue).get(admin::list).delete(admin::revoke),
        )
        .route("/health", get(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(front::correlate)),
        )
        .with_state(state)
}
