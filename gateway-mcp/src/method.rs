//! Typed MCP methods.
//!
//! Each inbound `(method, params)` pair is parsed once into an `McpMethod`,
//! so the dispatcher matches exhaustively over a closed set.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{DispatchError, DispatchResult};
use crate::types::{McpRequest, ToolCall};

/// `initialize` parameters.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Version requested by the client
    #[serde(default)]
    pub protocol_version: Option<String>,

    /// Client identity, passed through untouched
    #[serde(default)]
    pub client_info: Option<Value>,
}

/// `resources/read` parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReadResourceParams {
    /// URI to read
    pub uri: String,
}

/// `prompts/get` parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GetPromptParams {
    /// Prompt name
    pub name: String,

    /// Template arguments
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// The supported MCP methods.
#[derive(Debug, Clone, PartialEq)]
pub enum McpMethod {
    /// `initialize`
    Initialize(InitializeParams),
    /// `initialized` / `notifications/initialized`
    Initialized,
    /// `tools/list`
    ListTools,
    /// `tools/call`
    CallTool(ToolCall),
    /// `resources/list`
    ListResources,
    /// `resources/read`
    ReadResource(ReadResourceParams),
    /// `prompts/list`
    ListPrompts,
    /// `prompts/get`
    GetPrompt(GetPromptParams),
}

impl McpMethod {
    /// Parse a method name and its parameters.
    pub fn parse(method: &str, params: Option<&Value>) -> DispatchResult<Self> {
        match method {
            // initialize never fails, so malformed params fall back to defaults
            "initialize" => Ok(McpMethod::Initialize(
                params
                    .and_then(|p| InitializeParams::deserialize(p).ok())
                    .unwrap_or_default(),
            )),
            "initialized" | "notifications/initialized" => Ok(McpMethod::Initialized),
            "tools/list" => Ok(McpMethod::ListTools),
            "tools/call" => Ok(McpMethod::CallTool(require(method, params)?)),
            "resources/list" => Ok(McpMethod::ListResources),
            "resources/read" => Ok(McpMethod::ReadResource(require(method, params)?)),
            "prompts/list" => Ok(McpMethod::ListPrompts),
            "prompts/get" => Ok(McpMethod::GetPrompt(require(method, params)?)),
            other => Err(DispatchError::UnsupportedMethod(other.to_string())),
        }
    }

    /// Parse an inbound request.
    pub fn from_request(request: &McpRequest) -> DispatchResult<Self> {
        Self::parse(&request.method, request.params.as_ref())
    }

    /// Canonical method name.
    pub fn name(&self) -> &'static str {
        match self {
            McpMethod::Initialize(_) => "initialize",
            McpMethod::Initialized => "initialized",
            McpMethod::ListTools => "tools/list",
            McpMethod::CallTool(_) => "tools/call",
            McpMethod::ListResources => "resources/list",
            McpMethod::ReadResource(_) => "resources/read",
            McpMethod::ListPrompts => "prompts/list",
            McpMethod::GetPrompt(_) => "prompts/get",
        }
    }
}

fn decode<T: DeserializeOwned>(params: &Value) -> DispatchResult<T> {
    T::deserialize(params).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}

fn require<T: DeserializeOwned>(method: &str, params: Option<&Value>) -> DispatchResult<T> {
    match params {
        Some(params) => decode(params),
        None => Err(DispatchError::InvalidParams(format!(
            "{} requires params",
            method
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_without_params() {
        assert_eq!(McpMethod::parse("tools/list", None).unwrap(), McpMethod::ListTools);
        assert_eq!(
            McpMethod::parse("initialize", None).unwrap(),
            McpMethod::Initialize(InitializeParams::default())
        );
        assert_eq!(
            McpMethod::parse("notifications/initialized", None).unwrap(),
            McpMethod::Initialized
        );
    }

    #[test]
    fn test_initialize_tolerates_bad_params() {
        assert_eq!(
            McpMethod::parse("initialize", Some(&json!({"protocolVersion": 5}))).unwrap(),
            McpMethod::Initialize(InitializeParams::default())
        );
    }

    #[test]
    fn test_parse_tool_call() {
        let params = json!({"name": "get_project", "arguments": {"id": "p1"}});
        match McpMethod::parse("tools/call", Some(&params)).unwrap() {
            McpMethod::CallTool(call) => {
                assert_eq!(call.name, "get_project");
                assert_eq!(call.arguments["id"], "p1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_or_bad_params() {
        assert!(matches!(
            McpMethod::parse("tools/call", None),
            Err(DispatchError::InvalidParams(_))
        ));
        assert!(matches!(
            McpMethod::parse("resources/read", Some(&json!({"url": "x"}))),
            Err(DispatchError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_unknown_method() {
        assert!(matches!(
            McpMethod::parse("sampling/createMessage", None),
            Err(DispatchError::UnsupportedMethod(m)) if m == "sampling/createMessage"
        ));
    }

    #[test]
    fn test_prompt_arguments_default() {
        let parsed = McpMethod::parse("prompts/get", Some(&json!({"name": "project_summary"})))
            .unwrap();
        assert_eq!(
            parsed,
            McpMethod::GetPrompt(GetPromptParams {
                name: "project_summary".into(),
                arguments: HashMap::new(),
            })
        );
    }
}
