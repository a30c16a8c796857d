//! Project prompt templates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{PromptProvider, ToolContext};
use crate::clients::BackendClient;
use crate::error::{CatalogError, CatalogResult};
use crate::types::{PromptDefinition, PromptMessage};

/// Prompts built from live project data.
pub struct ProjectPrompts {
    client: Arc<BackendClient>,
}

impl ProjectPrompts {
    /// Create the provider.
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

fn required<'a>(arguments: &'a HashMap<String, String>, name: &str) -> CatalogResult<&'a str> {
    arguments
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CatalogError::InvalidArguments(format!("{} is required", name)))
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[async_trait]
impl PromptProvider for ProjectPrompts {
    fn prompts(&self) -> Vec<PromptDefinition> {
        vec![
            PromptDefinition::new(
                "project_summary",
                "Summarize a project's goals, status and open stories",
            )
            .with_argument("projectId", "The project to summarize", true),
            PromptDefinition::new(
                "story_breakdown",
                "Break a feature request into user stories for a project",
            )
            .with_argument("projectId", "The target project", true)
            .with_argument("feature", "The feature to break down", true),
        ]
    }

    async fn get(
        &self,
        name: &str,
        arguments: &HashMap<String, String>,
        _context: &ToolContext,
    ) -> CatalogResult<Vec<PromptMessage>> {
        match name {
            "project_summary" => {
                let project_id = required(arguments, "projectId")?;
                let project = self.client.get_project(project_id).await?;
                let stories = self.client.list_stories(project_id).await?;

                Ok(vec![PromptMessage::user(format!(
                    "Summarize the following project for a status update. Cover its goals, \
                     current progress and the stories still open.\n\nProject:\n{}\n\nStories:\n{}",
                    pretty(&project),
                    pretty(&stories)
                ))])
            }
            "story_breakdown" => {
                let project_id = required(arguments, "projectId")?;
                let feature = required(arguments, "feature")?;
                let project = self.client.get_project(project_id).await?;

                Ok(vec![
                    PromptMessage::user(format!(
                        "Project context:\n{}",
                        pretty(&project)
                    )),
                    PromptMessage::user(format!(
                        "Break the feature \"{}\" into independent user stories. For each \
                         story give a title, a one-sentence description and acceptance criteria.",
                        feature
                    )),
                ])
            }
            other => Err(CatalogError::NotFound(format!("prompt {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_argument() {
        let mut args = HashMap::new();
        args.insert("projectId".to_string(), "p1".to_string());
        args.insert("feature".to_string(), "  ".to_string());

        assert_eq!(required(&args, "projectId").unwrap(), "p1");
        assert!(matches!(
            required(&args, "feature"),
            Err(CatalogError::InvalidArguments(_))
        ));
        assert!(required(&args, "missing").is_err());
    }
}
