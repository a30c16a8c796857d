//! # Resource Types
//!
//! Defines the backend entity types the gateway forwards to, plus the
//! gateway-internal resources that only administrators may touch.

use serde::{Deserialize, Serialize};

/// Resource types that can have capabilities assigned.
///
/// - **Backend entities**: Project, Story, Feature, Actor, Diagram
/// - **Gateway internals**: Token, Connection (administrative only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Projects in the project-management backend.
    Project,
    /// User stories belonging to a project.
    Story,
    /// Features grouping stories.
    Feature,
    /// Actors (personas) referenced by stories.
    Actor,
    /// Diagrams attached to a project.
    Diagram,
    /// Gateway credentials.
    Token,
    /// Gateway push connections.
    Connection,
}

impl ResourceType {
    /// Get the string representation used in capability strings.
    ///
    /// Backend entities use their plural collection name (`projects`,
    /// `stories`, ...) so capabilities read like `projects:write`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Project => "projects",
            ResourceType::Story => "stories",
            ResourceType::Feature => "features",
            ResourceType::Actor => "actors",
            ResourceType::Diagram => "diagrams",
            ResourceType::Token => "tokens",
            ResourceType::Connection => "connections",
        }
    }

    /// Parse resource type from string representation.
    ///
    /// Accepts both singular and plural forms, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "project" | "projects" => Some(ResourceType::Project),
            "story" | "stories" => Some(ResourceType::Story),
            "feature" | "features" => Some(ResourceType::Feature),
            "actor" | "actors" => Some(ResourceType::Actor),
            "diagram" | "diagrams" => Some(ResourceType::Diagram),
            "token" | "tokens" => Some(ResourceType::Token),
            "connection" | "connections" => Some(ResourceType::Connection),
            _ => None,
        }
    }

    /// Backend entity types (everything a tool may forward to).
    pub fn entities() -> &'static [ResourceType] {
        &[
            ResourceType::Project,
            ResourceType::Story,
            ResourceType::Feature,
            ResourceType::Actor,
            ResourceType::Diagram,
        ]
    }

    /// Whether this resource belongs to the gateway itself rather than the backend.
    pub fn is_administrative(&self) -> bool {
        matches!(self, ResourceType::Token | ResourceType::Connection)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
