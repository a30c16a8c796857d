//! Default project catalog
//!
//! A small backend-backed catalog so the gateway is useful out of the box.
//! Tool permissions come from the standard operation table, not from the
//! descriptors.

pub mod projects;
pub mod prompts;
pub mod resources;

pub use projects::{CreateProjectTool, CreateStoryTool, GetProjectTool, ListProjectsTool};
pub use prompts::ProjectPrompts;
pub use resources::ProjectResources;

use crate::catalog::{Catalog, Tool};
use crate::clients::BackendClient;
use std::sync::Arc;

/// All project tools.
pub fn project_tools(client: Arc<BackendClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListProjectsTool::new(client.clone())),
        Arc::new(GetProjectTool::new(client.clone())),
        Arc::new(CreateProjectTool::new(client.clone())),
        Arc::new(CreateStoryTool::new(client)),
    ]
}

/// The default catalog: project tools, resources and prompts.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use gateway_mcp::clients::{BackendClient, BackendConfig};
/// use gateway_mcp::tools::project_catalog;
///
/// let client = Arc::new(BackendClient::new(BackendConfig::from_env()).unwrap());
/// let catalog = project_catalog(client);
/// assert_eq!(catalog.tool_count(), 4);
/// ```
pub fn project_catalog(client: Arc<BackendClient>) -> Catalog {
    Catalog::new()
        .with_tools(project_tools(client.clone()))
        .with_resources(Arc::new(ProjectResources::new(client.clone())))
        .with_prompts(Arc::new(ProjectPrompts::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::BackendConfig;
    use gateway_rbac::OperationTable;

    fn client() -> Arc<BackendClient> {
        Arc::new(BackendClient::new(BackendConfig::default()).unwrap())
    }

    #[test]
    fn test_catalog_contents() {
        let catalog = project_catalog(client());

        let names: Vec<String> = catalog
            .tool_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec!["create_project", "create_story", "get_project", "list_projects"]
        );
        assert_eq!(catalog.resource_definitions().len(), 2);
        assert_eq!(catalog.prompt_definitions().len(), 2);
    }

    #[test]
    fn test_every_tool_is_gated() {
        let table = OperationTable::standard();
        for tool in project_tools(client()) {
            let name = tool.definition().name;
            assert!(!table.required(&name).is_empty(), "{} is ungated", name);
        }
        assert_eq!(
            table.required("create_story"),
            &["projects:write".to_string(), "stories:write".to_string()]
        );
    }
}
