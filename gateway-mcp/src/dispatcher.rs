//! Transport-agnostic MCP method handling
//!
//! Every transport binding feeds inbound messages through `Dispatcher::handle`
//! and maps the typed result or failure onto its own wire format.

use gateway_auth::CredentialRecord;
use gateway_rbac::OperationTable;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::catalog::{Catalog, ToolContext};
use crate::error::{DispatchError, DispatchResult};
use crate::method::{GetPromptParams, InitializeParams, McpMethod, ReadResourceParams};
use crate::types::{
    ListCapability, McpRequest, ResourceContents, ServerCapabilities, ServerInfo, ToolCall,
    ToolResult, SUPPORTED_PROTOCOL_VERSIONS,
};

/// The canonical MCP method handler.
///
/// Holds no per-session state; `initialize` may be called at any time and
/// calls made before it are served normally.
pub struct Dispatcher {
    info: ServerInfo,
    catalog: Catalog,
    operations: OperationTable,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("info", &self.info)
            .field("catalog", &self.catalog)
            .field("operations", &self.operations.len())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(info: ServerInfo, catalog: Catalog, operations: OperationTable) -> Self {
        Self {
            info,
            catalog,
            operations,
        }
    }

    /// Create a dispatcher named after this crate with the standard table.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self::new(
            ServerInfo {
                name: "mcp-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            catalog,
            OperationTable::standard(),
        )
    }

    /// Server identity.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// The served catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Capability requirements in force.
    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    /// Capability flags advertised by `initialize`.
    pub fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: ListCapability { list_changed: true },
            resources: ListCapability::default(),
            prompts: ListCapability::default(),
        }
    }

    /// Handle one message on behalf of a verified caller.
    ///
    /// Returns the method result, which transports place under `result`.
    #[instrument(
        skip(self, request, credential),
        fields(method = %request.method, credential_id = %credential.id)
    )]
    pub async fn handle(
        &self,
        request: &McpRequest,
        credential: &CredentialRecord,
        correlation_id: Option<&str>,
    ) -> DispatchResult<Value> {
        let method = McpMethod::from_request(request)?;
        let context = ToolContext::new(credential.clone(), correlation_id.map(str::to_string));

        let result = self.dispatch(method, &context).await;
        if let Err(e) = &result {
            debug!(error = %e, "Dispatch failed");
        }
        result
    }

    /// Handle an already parsed method.
    pub async fn dispatch(&self, method: McpMethod, context: &ToolContext) -> DispatchResult<Value> {
        match method {
            McpMethod::Initialize(params) => Ok(self.initialize(&params)),
            McpMethod::Initialized => Ok(json!({})),
            McpMethod::ListTools => Ok(self.list_tools(&context.credential)),
            McpMethod::CallTool(call) => self.call_tool(call, context).await,
            McpMethod::ListResources => {
                Ok(json!({ "resources": self.catalog.resource_definitions() }))
            }
            McpMethod::ReadResource(params) => self.read_resource(params, context).await,
            McpMethod::ListPrompts => Ok(json!({ "prompts": self.catalog.prompt_definitions() })),
            McpMethod::GetPrompt(params) => self.get_prompt(params, context).await,
        }
    }

    fn initialize(&self, params: &InitializeParams) -> Value {
        let version = negotiate_version(params.protocol_version.as_deref());
        json!({
            "protocolVersion": version,
            "capabilities": self.capabilities(),
            "serverInfo": self.info,
        })
    }

    fn list_tools(&self, credential: &CredentialRecord) -> Value {
        let tools: Vec<_> = self
            .catalog
            .tool_definitions()
            .into_iter()
            .filter(|t| credential.has_permission(self.operations.required(&t.name)))
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, call: ToolCall, context: &ToolContext) -> DispatchResult<Value> {
        // Gated names without a handler are still unknown tools.
        let tool = self
            .catalog
            .tool(&call.name)
            .ok_or_else(|| DispatchError::UnknownTool(call.name.clone()))?;

        let required = self.operations.required(&call.name);
        if !context.credential.has_permission(required) {
            warn!(
                tool = %call.name,
                credential_id = %context.credential.id,
                "Tool call denied"
            );
            return Err(DispatchError::InsufficientPermissions(call.name));
        }

        let output = tool
            .call(call.arguments, context)
            .await
            .map_err(|e| DispatchError::ToolFailed {
                name: call.name.clone(),
                cause: e.to_string(),
            })?;

        serde_json::to_value(ToolResult::from_value(output))
            .map_err(|e| DispatchError::Internal(e.to_string()))
    }

    async fn read_resource(
        &self,
        params: ReadResourceParams,
        context: &ToolContext,
    ) -> DispatchResult<Value> {
        let failed = |cause: String| DispatchError::ResourceReadFailed {
            uri: params.uri.clone(),
            cause,
        };

        let reader = self
            .catalog
            .reader_for(&params.uri)
            .ok_or_else(|| failed("no resource reader registered".to_string()))?;

        let text = reader
            .read(&params.uri, context)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let contents = ResourceContents {
            uri: params.uri.clone(),
            mime_type: Some("text/plain".to_string()),
            text,
        };
        Ok(json!({ "contents": [contents] }))
    }

    async fn get_prompt(
        &self,
        params: GetPromptParams,
        context: &ToolContext,
    ) -> DispatchResult<Value> {
        let failed = |cause: String| DispatchError::PromptGetFailed {
            name: params.name.clone(),
            cause,
        };

        let provider = self
            .catalog
            .provider_for(&params.name)
            .ok_or_else(|| failed("no prompt provider registered".to_string()))?;

        let messages = provider
            .get(&params.name, &params.arguments, context)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let description = self
            .catalog
            .prompt_definitions()
            .into_iter()
            .find(|p| p.name == params.name)
            .and_then(|p| p.description);

        Ok(json!({
            "description": description,
            "messages": messages,
        }))
    }
}

/// Pick the requested version if supported, else the most recent one.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|s| *s == v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PromptProvider, ResourceReader, Tool};
    use crate::error::{CatalogError, CatalogResult};
    use crate::types::{PromptDefinition, PromptMessage, ResourceDefinition, ToolDefinition};
    use async_trait::async_trait;
    use chrono::Utc;
    use gateway_auth::CredentialSource;
    use gateway_rbac::CredentialKind;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StaticTool {
        name: &'static str,
        output: Value,
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.name, "Returns a fixed value")
        }

        async fn call(&self, _arguments: Value, _context: &ToolContext) -> CatalogResult<Value> {
            Ok(self.output.clone())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("list_projects", "Always fails")
        }

        async fn call(&self, _arguments: Value, _context: &ToolContext) -> CatalogResult<Value> {
            Err(CatalogError::Failed("backend unavailable".into()))
        }
    }

    struct Notes;

    #[async_trait]
    impl ResourceReader for Notes {
        fn resources(&self) -> Vec<ResourceDefinition> {
            vec![ResourceDefinition::new("notes://{id}", "Note")]
        }

        async fn read(&self, uri: &str, _context: &ToolContext) -> CatalogResult<String> {
            match uri {
                "notes://1" => Ok("first note".into()),
                _ => Err(CatalogError::NotFound(uri.into())),
            }
        }
    }

    struct Greeting;

    #[async_trait]
    impl PromptProvider for Greeting {
        fn prompts(&self) -> Vec<PromptDefinition> {
            vec![PromptDefinition::new("greet", "Say hello").with_argument("who", "Name", true)]
        }

        async fn get(
            &self,
            name: &str,
            arguments: &HashMap<String, String>,
            _context: &ToolContext,
        ) -> CatalogResult<Vec<PromptMessage>> {
            let who = arguments
                .get("who")
                .ok_or_else(|| CatalogError::InvalidArguments("who is required".into()))?;
            Ok(vec![PromptMessage::user(format!("{} {}", name, who))])
        }
    }

    fn credential(kind: CredentialKind) -> CredentialRecord {
        CredentialRecord::new("cred_t", kind, Utc::now(), None, None, CredentialSource::Issued)
    }

    fn dispatcher() -> Dispatcher {
        let catalog = Catalog::new()
            .with_tool(Arc::new(StaticTool {
                name: "get_project",
                output: json!({"id": "p1"}),
            }))
            .with_tool(Arc::new(StaticTool {
                name: "create_project",
                output: json!("created"),
            }))
            .with_tool(Arc::new(StaticTool {
                name: "ping_backend",
                output: json!(true),
            }))
            .with_resources(Arc::new(Notes))
            .with_prompts(Arc::new(Greeting));
        Dispatcher::with_catalog(catalog)
    }

    async fn run(
        dispatcher: &Dispatcher,
        kind: CredentialKind,
        method: &str,
        params: Option<Value>,
    ) -> DispatchResult<Value> {
        let mut request = McpRequest::new(method);
        request.params = params;
        dispatcher.handle(&request, &credential(kind), Some("req-1")).await
    }

    #[test]
    fn test_negotiate_version() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("2025-03-26")), "2025-03-26");
        assert_eq!(negotiate_version(Some("1999-01-01")), "2025-03-26");
        assert_eq!(negotiate_version(None), "2025-03-26");
    }

    #[tokio::test]
    async fn test_initialize() {
        let d = dispatcher();
        let result = run(
            &d,
            CredentialKind::Readonly,
            "initialize",
            Some(json!({"protocolVersion": "2024-11-05"})),
        )
        .await
        .unwrap();

        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(result["capabilities"]["resources"]["listChanged"], false);
        assert_eq!(result["serverInfo"]["name"], "mcp-gateway");

        let ack = run(&d, CredentialKind::Readonly, "initialized", None).await.unwrap();
        assert_eq!(ack, json!({}));
    }

    #[tokio::test]
    async fn test_readonly_scenario() {
        let d = dispatcher();

        let denied = run(
            &d,
            CredentialKind::Readonly,
            "tools/call",
            Some(json!({"name": "create_project", "arguments": {}})),
        )
        .await;
        assert!(matches!(denied, Err(DispatchError::InsufficientPermissions(ref op)) if op == "create_project"));

        let listed = run(&d, CredentialKind::Readonly, "tools/list", None).await.unwrap();
        let names: Vec<&str> = listed["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["get_project", "ping_backend"]);

        let resources = run(&d, CredentialKind::Readonly, "resources/list", None).await.unwrap();
        assert_eq!(resources["resources"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_regardless_of_permissions() {
        let d = dispatcher();
        for kind in CredentialKind::all() {
            let result = run(
                &d,
                kind,
                "tools/call",
                Some(json!({"name": "does_not_exist"})),
            )
            .await;
            assert!(matches!(result, Err(DispatchError::UnknownTool(_))));
        }
    }

    #[tokio::test]
    async fn test_gated_but_unregistered_tool_is_unknown() {
        let d = Dispatcher::with_catalog(Catalog::new());
        for name in ["delete_project", "update_story", "create_diagram", "list_projects"] {
            let result = run(
                &d,
                CredentialKind::Readonly,
                "tools/call",
                Some(json!({"name": name})),
            )
            .await;
            assert!(
                matches!(result, Err(DispatchError::UnknownTool(ref n)) if n == name),
                "{}: {:?}",
                name,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_permission_checked_before_invocation() {
        let d = dispatcher();
        let credential = CredentialRecord {
            permissions: Default::default(),
            ..credential(CredentialKind::Readonly)
        };
        let result = d
            .handle(
                &McpRequest::new("tools/call").with_params(json!({"name": "get_project"})),
                &credential,
                None,
            )
            .await;
        assert!(matches!(result, Err(DispatchError::InsufficientPermissions(_))));
    }

    #[tokio::test]
    async fn test_tool_result_wrapping() {
        let d = dispatcher();

        let structured = run(
            &d,
            CredentialKind::Team,
            "tools/call",
            Some(json!({"name": "get_project"})),
        )
        .await
        .unwrap();
        assert_eq!(structured["content"][0]["type"], "text");
        assert_eq!(structured["content"][0]["text"], "{\n  \"id\": \"p1\"\n}");

        let text = run(
            &d,
            CredentialKind::Team,
            "tools/call",
            Some(json!({"name": "create_project"})),
        )
        .await
        .unwrap();
        assert_eq!(text["content"][0]["text"], "created");
    }

    #[tokio::test]
    async fn test_tool_failure_propagates() {
        let d = Dispatcher::with_catalog(Catalog::new().with_tool(Arc::new(FailingTool)));
        let result = run(
            &d,
            CredentialKind::Team,
            "tools/call",
            Some(json!({"name": "list_projects"})),
        )
        .await;

        match result {
            Err(DispatchError::ToolFailed { name, cause }) => {
                assert_eq!(name, "list_projects");
                assert!(cause.contains("backend unavailable"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resource_read() {
        let d = dispatcher();

        let ok = run(
            &d,
            CredentialKind::Readonly,
            "resources/read",
            Some(json!({"uri": "notes://1"})),
        )
        .await
        .unwrap();
        assert_eq!(ok["contents"][0]["uri"], "notes://1");
        assert_eq!(ok["contents"][0]["text"], "first note");

        let failed = run(
            &d,
            CredentialKind::Readonly,
            "resources/read",
            Some(json!({"uri": "notes://2"})),
        )
        .await;
        match failed {
            Err(DispatchError::ResourceReadFailed { uri, cause }) => {
                assert_eq!(uri, "notes://2");
                assert!(cause.contains("notes://2"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prompts() {
        let d = dispatcher();

        let listed = run(&d, CredentialKind::Readonly, "prompts/list", None).await.unwrap();
        assert_eq!(listed["prompts"][0]["name"], "greet");

        let got = run(
            &d,
            CredentialKind::Readonly,
            "prompts/get",
            Some(json!({"name": "greet", "arguments": {"who": "team"}})),
        )
        .await
        .unwrap();
        assert_eq!(got["description"], "Say hello");
        assert_eq!(got["messages"][0]["role"], "user");
        assert_eq!(got["messages"][0]["content"]["text"], "greet team");

        let failed = run(
            &d,
            CredentialKind::Readonly,
            "prompts/get",
            Some(json!({"name": "greet"})),
        )
        .await;
        assert!(matches!(failed, Err(DispatchError::PromptGetFailed { ref name, .. }) if name == "greet"));
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let d = dispatcher();
        let result = run(&d, CredentialKind::Master, "completion/complete", None).await;
        assert!(matches!(result, Err(DispatchError::UnsupportedMethod(_))));
    }
}
