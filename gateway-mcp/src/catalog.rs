//! Tool, resource and prompt collaborators.
//!
//! The dispatcher only knows these traits. Concrete catalogs (see
//! `crate::tools`) forward to the backend REST API.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use gateway_auth::CredentialRecord;

use crate::error::CatalogResult;
use crate::types::{PromptDefinition, PromptMessage, ResourceDefinition, ToolDefinition};

/// Per-call context handed to collaborators.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Verified caller
    pub credential: CredentialRecord,

    /// Request correlation ID
    pub correlation_id: Option<String>,
}

impl ToolContext {
    /// Create a context for a verified caller.
    pub fn new(credential: CredentialRecord, correlation_id: Option<String>) -> Self {
        Self {
            credential,
            correlation_id,
        }
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool descriptor.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments.
    ///
    /// String results are returned to the client verbatim; any other value
    /// is pretty-printed.
    async fn call(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> CatalogResult<serde_json::Value>;
}

/// Source of readable resources.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Static resource descriptors.
    fn resources(&self) -> Vec<ResourceDefinition>;

    /// Read one resource as text.
    async fn read(&self, uri: &str, context: &ToolContext) -> CatalogResult<String>;
}

/// Source of prompt templates.
#[async_trait]
pub trait PromptProvider: Send + Sync {
    /// Static prompt descriptors.
    fn prompts(&self) -> Vec<PromptDefinition>;

    /// Render one prompt.
    async fn get(
        &self,
        name: &str,
        arguments: &HashMap<String, String>,
        context: &ToolContext,
    ) -> CatalogResult<Vec<PromptMessage>>;
}

/// Everything the dispatcher can serve, fixed at construction.
#[derive(Clone, Default)]
pub struct Catalog {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    resources: Vec<Arc<dyn ResourceReader>>,
    prompts: Vec<Arc<dyn PromptProvider>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("resource_readers", &self.resources.len())
            .field("prompt_providers", &self.prompts.len())
            .finish()
    }
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A later tool with the same name replaces the earlier one.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.definition().name, tool);
        self
    }

    /// Add several tools.
    pub fn with_tools(self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        tools.into_iter().fold(self, Catalog::with_tool)
    }

    /// Add a resource reader.
    pub fn with_resources(mut self, reader: Arc<dyn ResourceReader>) -> Self {
        self.resources.push(reader);
        self
    }

    /// Add a prompt provider.
    pub fn with_prompts(mut self, provider: Arc<dyn PromptProvider>) -> Self {
        self.prompts.push(provider);
        self
    }

    /// Look up a tool by name.
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// All tool descriptors, sorted by name.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// All resource descriptors.
    pub fn resource_definitions(&self) -> Vec<ResourceDefinition> {
        self.resources.iter().flat_map(|r| r.resources()).collect()
    }

    /// All prompt descriptors.
    pub fn prompt_definitions(&self) -> Vec<PromptDefinition> {
        self.prompts.iter().flat_map(|p| p.prompts()).collect()
    }

    /// Reader responsible for `uri`: the first whose descriptors match it.
    ///
    /// Descriptor URIs may end in a `{placeholder}` segment, which matches
    /// any non-empty suffix. Falls back to the first reader.
    pub fn reader_for(&self, uri: &str) -> Option<&Arc<dyn ResourceReader>> {
        self.resources
            .iter()
            .find(|r| r.resources().iter().any(|d| uri_matches(&d.uri, uri)))
            .or_else(|| self.resources.first())
    }

    /// Provider declaring a prompt called `name`. Falls back to the first.
    pub fn provider_for(&self, name: &str) -> Option<&Arc<dyn PromptProvider>> {
        self.prompts
            .iter()
            .find(|p| p.prompts().iter().any(|d| d.name == name))
            .or_else(|| self.prompts.first())
    }

    /// Number of tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

fn uri_matches(pattern: &str, uri: &str) -> bool {
    match pattern.find('{') {
        Some(start) if pattern.ends_with('}') => {
            let prefix = &pattern[..start];
            uri.len() > prefix.len() && uri.starts_with(prefix)
        }
        _ => pattern == uri,
    }
}
