//! Project resources: `project://list` and `project://{id}`.
//!
//! Reads are gated here rather than in the dispatcher: the caller must hold
//! `projects:read`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{ResourceReader, ToolContext};
use crate::clients::BackendClient;
use crate::error::{CatalogError, CatalogResult};
use crate::types::ResourceDefinition;

const SCHEME: &str = "project://";
const LIST_URI: &str = "project://list";

/// Resource reader over the backend's projects.
pub struct ProjectResources {
    client: Arc<BackendClient>,
}

impl ProjectResources {
    /// Create the reader.
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceReader for ProjectResources {
    fn resources(&self) -> Vec<ResourceDefinition> {
        vec![
            ResourceDefinition::new(LIST_URI, "Projects")
                .with_description("All projects")
                .with_mime_type("application/json"),
            ResourceDefinition::new("project://{id}", "Project")
                .with_description("One project by id")
                .with_mime_type("application/json"),
        ]
    }

    async fn read(&self, uri: &str, context: &ToolContext) -> CatalogResult<String> {
        if !context.credential.has_permission(&["projects:read"]) {
            return Err(CatalogError::Failed("insufficient permissions".to_string()));
        }

        let value = match uri.strip_prefix(SCHEME) {
            Some("list") => self.client.list_projects().await?,
            Some(id) if !id.is_empty() && !id.contains('/') => self.client.get_project(id).await?,
            _ => return Err(CatalogError::NotFound(uri.to_string())),
        };

        serde_json::to_string_pretty(&value).map_err(|e| CatalogError::Failed(e.to_string()))
    }
}
