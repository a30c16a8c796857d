//! # Gateway MCP
//!
//! The transport-agnostic Model Context Protocol dispatcher of the gateway,
//! together with the collaborators it calls.
//!
//! ## Overview
//!
//! The gateway-mcp crate handles:
//! - **Types**: JSON-RPC envelopes, tool/resource/prompt descriptors
//! - **Methods**: Inbound `(method, params)` parsed into a closed `McpMethod` set
//! - **Dispatcher**: One `handle` function shared by every transport binding,
//!   with capability checks against the operation table
//! - **Catalog**: `Tool`, `ResourceReader` and `PromptProvider` traits
//! - **Clients**: The project-management REST backend
//!
//! ## Supported methods
//!
//! - `initialize`: Negotiate the protocol version (never fails)
//! - `initialized`: Acknowledgement
//! - `tools/list`: Tools the caller is permitted to call
//! - `tools/call`: Invoke a tool
//! - `resources/list` / `resources/read`
//! - `prompts/list` / `prompts/get`
//!
//! Anything else fails with `DispatchError::UnsupportedMethod`.
//!
//! ## Usage
//!
//! ```rust
//! use gateway_auth::{AuthConfig, AuthManager};
//! use gateway_mcp::{Catalog, Dispatcher, McpRequest};
//! use gateway_rbac::CredentialKind;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let auth = AuthManager::new(AuthConfig::new("a-secret-of-at-least-16-bytes")).unwrap();
//! let record = auth.issue(CredentialKind::Readonly, None, None).unwrap().record;
//!
//! let dispatcher = Dispatcher::with_catalog(Catalog::new());
//! let result = dispatcher
//!     .handle(&McpRequest::new("initialize"), &record, None)
//!     .await
//!     .unwrap();
//! assert_eq!(result["protocolVersion"], "2025-03-26");
//! # }
//! ```

pub mod catalog;
pub mod clients;
pub mod dispatcher;
pub mod error;
pub mod method;
pub mod retry;
pub mod tools;
pub mod types;

// Re-export main types
pub use catalog::{Catalog, PromptProvider, ResourceReader, Tool, ToolContext};
pub use dispatcher::{negotiate_version, Dispatcher};
pub use error::{CatalogError, CatalogResult, DispatchError, DispatchResult};
pub use method::McpMethod;
pub use retry::{with_retry, with_retry_if, RetryConfig};
pub use types::{
    ContentBlock, McpError, McpRequest, PromptDefinition, PromptMessage,
    RequestId, ResourceDefinition, ServerCapabilities, ServerInfo, ToolCall, ToolDefinition,
    ToolResult, SUPPORTED_PROTOCOL_VERSIONS,
};

// Re-export the default catalog and backend client
pub use clients::{BackendClient, BackendConfig, BackendError};
pub use tools::project_catalog;
