//! Project and story tools
//!
//! Each tool validates its arguments into a typed struct, then forwards to
//! the backend client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::catalog::{Tool, ToolContext};
use crate::clients::{BackendClient, NewProject, NewStory};
use crate::error::{CatalogError, CatalogResult};
use crate::types::ToolDefinition;

fn parse_args<T: DeserializeOwned>(arguments: Value) -> CatalogResult<T> {
    // Missing arguments are treated as an empty object
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| CatalogError::InvalidArguments(e.to_string()))
}

/// Tool listing every project.
pub struct ListProjectsTool {
    client: Arc<BackendClient>,
}

impl ListProjectsTool {
    /// Create the tool.
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_projects", "List all projects")
    }

    #[instrument(skip_all, fields(tool = "list_projects"))]
    async fn call(&self, _arguments: Value, _context: &ToolContext) -> CatalogResult<Value> {
        Ok(self.client.list_projects().await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectIdArgs {
    #[serde(alias = "id")]
    project_id: String,
}

/// Tool fetching one project.
pub struct GetProjectTool {
    client: Arc<BackendClient>,
}

impl GetProjectTool {
    /// Create the tool.
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetProjectTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_project", "Get a project by id").with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "projectId": {
                    "type": "string",
                    "description": "The project id"
                }
            },
            "required": ["projectId"]
        }))
    }

    #[instrument(skip_all, fields(tool = "get_project"))]
    async fn call(&self, arguments: Value, _context: &ToolContext) -> CatalogResult<Value> {
        let args: ProjectIdArgs = parse_args(arguments)?;
        debug!(project_id = %args.project_id, "Fetching project");
        Ok(self.client.get_project(&args.project_id).await?)
    }
}

/// Tool creating a project.
pub struct CreateProjectTool {
    client: Arc<BackendClient>,
}

impl CreateProjectTool {
    /// Create the tool.
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_project", "Create a new project").with_schema(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Project name"
                    },
                    "description": {
                        "type": "string",
                        "description": "What the project is about"
                    }
                },
                "required": ["name"]
            }),
        )
    }

    #[instrument(skip_all, fields(tool = "create_project"))]
    async fn call(&self, arguments: Value, _context: &ToolContext) -> CatalogResult<Value> {
        let project: NewProject = parse_args(arguments)?;
        if project.name.trim().is_empty() {
            return Err(CatalogError::InvalidArguments(
                "name must not be empty".to_string(),
            ));
        }
        Ok(self.client.create_project(&project).await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoryArgs {
    project_id: String,
    #[serde(flatten)]
    story: NewStory,
}

/// Tool adding a user story to a project.
pub struct CreateStoryTool {
    client: Arc<BackendClient>,
}

impl CreateStoryTool {
    /// Create the tool.
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateStoryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create_story", "Create a user story in a project").with_schema(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "projectId": {"type": "string"},
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "acceptanceCriteria": {
                        "type": "array",
                        "items": {"type": "string"}
                    }
                },
                "required": ["projectId", "title"]
            }),
        )
    }

    #[instrument(skip_all, fields(tool = "create_story"))]
    async fn call(&self, arguments: Value, _context: &ToolContext) -> CatalogResult<Value> {
        let args: CreateStoryArgs = parse_args(arguments)?;
        Ok(self
            .client
            .create_story(&args.project_id, &args.story)
            .await?)
    }
}
