//! Dispatcher and collaborator error types

use thiserror::Error;

use crate::clients::BackendError;
use crate::types::McpError;

/// Error raised by a tool, resource or prompt collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Arguments did not match the declared shape
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The requested item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Any other failure
    #[error("{0}")]
    Failed(String),
}

/// Result type for collaborator calls.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure of a dispatched MCP method.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Caller lacks a capability required by the operation
    #[error("Insufficient permissions for {0}")]
    InsufficientPermissions(String),

    /// No tool is registered under the name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The resource collaborator failed
    #[error("Failed to read resource {uri}: {cause}")]
    ResourceReadFailed {
        /// Requested URI
        uri: String,
        /// Underlying failure
        cause: String,
    },

    /// The prompt collaborator failed
    #[error("Failed to get prompt {name}: {cause}")]
    PromptGetFailed {
        /// Requested prompt
        name: String,
        /// Underlying failure
        cause: String,
    },

    /// The method is not part of the supported set
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Parameters did not match the method's shape
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// A tool handler failed
    #[error("Tool {name} failed: {cause}")]
    ToolFailed {
        /// Tool name
        name: String,
        /// Underlying failure
        cause: String,
    },

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for dispatched methods.
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    /// JSON-RPC error code for this failure.
    pub fn rpc_code(&self) -> i32 {
        match self {
            DispatchError::UnsupportedMethod(_) => McpError::METHOD_NOT_FOUND,
            DispatchError::InvalidParams(_) => McpError::INVALID_PARAMS,
            _ => McpError::INTERNAL_ERROR,
        }
    }

    /// Stable error code for HTTP responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            DispatchError::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            DispatchError::UnknownTool(_) => "UNKNOWN_TOOL",
            DispatchError::ResourceReadFailed { .. } => "RESOURCE_READ_FAILED",
            DispatchError::PromptGetFailed { .. } => "PROMPT_GET_FAILED",
            DispatchError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            DispatchError::InvalidParams(_) => "INVALID_PARAMS",
            DispatchError::ToolFailed { .. } => "TOOL_FAILED",
            DispatchError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to a JSON-RPC error object.
    pub fn to_mcp_error(&self) -> McpError {
        McpError::new(self.rpc_code(), self.to_string())
            .with_data(serde_json::json!({ "kind": self.error_code() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_codes() {
        assert_eq!(DispatchError::UnsupportedMethod("x".into()).rpc_code(), -32601);
        assert_eq!(DispatchError::InvalidParams("x".into()).rpc_code(), -32602);
        assert_eq!(DispatchError::UnknownTool("x".into()).rpc_code(), -32603);
        assert_eq!(DispatchError::Internal("x".into()).rpc_code(), -32603);
    }

    #[test]
    fn test_messages_name_operation_only() {
        let err = DispatchError::InsufficientPermissions("create_project".into());
        assert_eq!(err.to_string(), "Insufficient permissions for create_project");

        let err = DispatchError::ResourceReadFailed {
            uri: "project://42".into(),
            cause: "backend down".into(),
        };
        assert!(err.to_string().contains("project://42"));
        assert!(err.to_string().contains("backend down"));
    }

    #[test]
    fn test_mcp_error_conversion() {
        let err = DispatchError::UnknownTool("nope".into()).to_mcp_error();
        assert_eq!(err.code, -32603);
        assert_eq!(err.data.unwrap()["kind"], "UNKNOWN_TOOL");
    }
}
