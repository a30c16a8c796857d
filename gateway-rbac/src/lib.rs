//! # Gateway RBAC (Capability Model)
//!
//! This crate provides the capability model for the MCP gateway.
//!
//! ## Overview
//!
//! The gateway-rbac crate handles:
//! - **Resources**: Backend entities (projects, stories, features, actors, diagrams)
//!   and gateway internals (tokens, connections)
//! - **Actions**: `read`, `write`, `manage`
//! - **Permissions**: Resource + Action capability strings
//! - **Credential Kinds**: Fixed capability sets for `master`, `team`, `readonly`
//! - **Operations**: Static table from operation name to required capabilities
//!
//! ## Architecture
//!
//! ```text
//! Capability = Resource + ":" + Action
//!
//! Examples:
//!   "projects:read"       - List and fetch projects
//!   "stories:write"       - Create, update and delete stories
//!   "tokens:manage"       - Administer gateway credentials (master only)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use gateway_rbac::{has_permission, CredentialKind, OperationTable};
//!
//! let table = OperationTable::standard();
//! let team = CredentialKind::Team.permissions();
//!
//! // Conjunction: every required capability must be held
//! assert!(has_permission(&team, table.required("create_story")));
//! assert!(!has_permission(&team, table.required("admin/tokens/issue")));
//! ```

pub mod actions;
pub mod kinds;
pub mod operations;
pub mod permissions;
pub mod resources;

// Re-export main types for convenience
pub use actions::Action;
pub use kinds::CredentialKind;
pub use operations::{
    OperationTable, OP_BROADCAST, OP_CONNECTION_STATS, OP_ISSUE_TOKEN, OP_LIST_TOKENS,
    OP_REVOKE_TOKEN,
};
pub use permissions::{has_permission, Permission, PermissionSet};
pub use resources::ResourceType;
