//! # Actions
//!
//! Defines the actions that can be performed on resources.

use serde::{Deserialize, Serialize};

/// Actions that can be performed on resources.
///
/// - **Read**: list and fetch backend entities
/// - **Write**: create, update and delete backend entities
/// - **Manage**: administer gateway internals (tokens, connections)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read/view resource.
    Read,

    /// Create, update or delete resource.
    Write,

    /// Administer gateway-internal resources.
    Manage,
}

impl Action {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Manage => "manage",
        }
    }

    /// Parse action from string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use gateway_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("read"), Some(Action::Read));
    /// assert_eq!(Action::parse("update"), Some(Action::Write)); // Alias
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" | "view" | "get" | "list" => Some(Action::Read),
            "write" | "create" | "update" | "delete" | "edit" => Some(Action::Write),
            "manage" | "admin" => Some(Action::Manage),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![Action::Read, Action::Write, Action::Manage]
    }

    /// Check if this is a read-only action.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::Read)
    }
}
