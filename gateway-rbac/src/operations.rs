//! # Operation Table
//!
//! Maps each operation name (tool names and administrative operations) to
//! the capabilities a caller must hold. Operations absent from the table
//! are unrestricted.

use std::collections::HashMap;

use crate::permissions::{has_permission, PermissionSet};

/// Token administration: issue a credential.
pub const OP_ISSUE_TOKEN: &str = "admin/tokens/issue";
/// Token administration: revoke a credential.
pub const OP_REVOKE_TOKEN: &str = "admin/tokens/revoke";
/// Token administration: list credentials.
pub const OP_LIST_TOKENS: &str = "admin/tokens/list";
/// Push administration: broadcast an event.
pub const OP_BROADCAST: &str = "admin/connections/broadcast";
/// Push administration: connection statistics.
pub const OP_CONNECTION_STATS: &str = "admin/connections/stats";

/// Built-in requirements for every operation the gateway knows about.
const STANDARD_OPERATIONS: &[(&str, &[&str])] = &[
    // Projects
    ("list_projects", &["projects:read"]),
    ("get_project", &["projects:read"]),
    ("create_project", &["projects:write"]),
    ("update_project", &["projects:write"]),
    ("delete_project", &["projects:write"]),
    // Stories
    ("list_stories", &["stories:read"]),
    ("get_story", &["stories:read"]),
    ("create_story", &["projects:write", "stories:write"]),
    ("update_story", &["stories:write"]),
    ("delete_story", &["stories:write"]),
    // Features
    ("list_features", &["features:read"]),
    ("get_feature", &["features:read"]),
    ("create_feature", &["projects:write", "features:write"]),
    ("update_feature", &["features:write"]),
    ("delete_feature", &["features:write"]),
    // Actors
    ("list_actors", &["actors:read"]),
    ("get_actor", &["actors:read"]),
    ("create_actor", &["projects:write", "actors:write"]),
    ("update_actor", &["actors:write"]),
    ("delete_actor", &["actors:write"]),
    // Diagrams
    ("list_diagrams", &["diagrams:read"]),
    ("get_diagram", &["diagrams:read"]),
    ("create_diagram", &["projects:write", "diagrams:write"]),
    ("update_diagram", &["diagrams:write"]),
    ("delete_diagram", &["diagrams:write"]),
    // Gateway administration
    (OP_ISSUE_TOKEN, &["tokens:manage"]),
    (OP_REVOKE_TOKEN, &["tokens:manage"]),
    (OP_LIST_TOKENS, &["tokens:manage"]),
    (OP_BROADCAST, &["connections:manage"]),
    (OP_CONNECTION_STATS, &["connections:manage"]),
];

/// Lookup table from operation name to required capabilities.
///
/// # Example
///
/// ```
/// use gateway_rbac::{CredentialKind, OperationTable};
///
/// let table = OperationTable::standard();
/// let readonly = CredentialKind::Readonly.permissions();
///
/// assert!(table.is_permitted("list_projects", &readonly));
/// assert!(!table.is_permitted("create_project", &readonly));
/// assert!(table.required("no_such_operation").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    requirements: HashMap<String, Vec<String>>,
}

impl OperationTable {
    /// Create an empty table (every operation unrestricted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the table with the built-in operation requirements.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (name, required) in STANDARD_OPERATIONS {
            table.set(*name, required.iter().map(|s| s.to_string()).collect());
        }
        table
    }

    /// Add or replace the requirements for an operation.
    pub fn with_operation<S: AsRef<str>>(mut self, name: impl Into<String>, required: &[S]) -> Self {
        self.set(name, required.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    /// Add or replace the requirements for an operation in place.
    pub fn set(&mut self, name: impl Into<String>, required: Vec<String>) {
        self.requirements.insert(name.into(), required);
    }

    /// Capabilities required for an operation (empty = no restriction).
    pub fn required(&self, name: &str) -> &[String] {
        self.requirements
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a capability set satisfies an operation's requirements.
    pub fn is_permitted(&self, name: &str, granted: &PermissionSet) -> bool {
        has_permission(granted, self.required(name))
    }

    /// Number of operations with explicit requirements.
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
