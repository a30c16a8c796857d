//! # Permissions
//!
//! Capability strings and capability sets.
//! A typed permission combines a resource type with an action
//! (`projects:write`); sets store plain strings so capabilities embedded
//! in signed tokens survive even when they name nothing this gateway knows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::actions::Action;
use crate::resources::ResourceType;

/// A permission is a combination of resource type and action.
///
/// # Example
///
/// ```
/// use gateway_rbac::permissions::Permission;
/// use gateway_rbac::resources::ResourceType;
/// use gateway_rbac::actions::Action;
///
/// let perm = Permission::new(ResourceType::Project, Action::Write);
/// assert_eq!(perm.to_string(), "projects:write");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    /// The resource type this permission applies to.
    pub resource: ResourceType,
    /// The action allowed on the resource.
    pub action: Action,
}

impl Permission {
    /// Create a new permission.
    pub fn new(resource: ResourceType, action: Action) -> Self {
        Self { resource, action }
    }

    /// Parse from string (e.g., "projects:read").
    ///
    /// # Example
    ///
    /// ```
    /// use gateway_rbac::permissions::Permission;
    /// use gateway_rbac::resources::ResourceType;
    /// use gateway_rbac::actions::Action;
    ///
    /// let perm = Permission::from_string("stories:write").unwrap();
    /// assert_eq!(perm.resource, ResourceType::Story);
    /// assert_eq!(perm.action, Action::Write);
    /// assert!(Permission::from_string("stories").is_none());
    /// ```
    pub fn from_string(s: &str) -> Option<Self> {
        let (resource, action) = s.split_once(':')?;
        Some(Self {
            resource: ResourceType::parse(resource)?,
            action: Action::parse(action)?,
        })
    }

    /// Whether this permission grants administrative access to the gateway itself.
    pub fn is_administrative(&self) -> bool {
        self.resource.is_administrative()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource.as_str(), self.action.as_str())
    }
}

/// A set of capability strings held by a credential.
///
/// Membership is exact: no wildcard or implication rules apply, so a set
/// grants precisely the strings it contains.
///
/// # Example
///
/// ```
/// use gateway_rbac::permissions::{Permission, PermissionSet};
/// use gateway_rbac::resources::ResourceType;
/// use gateway_rbac::actions::Action;
///
/// let mut set = PermissionSet::new();
/// set.add(Permission::new(ResourceType::Project, Action::Read));
///
/// assert!(set.has("projects:read"));
/// assert!(!set.has_all(&["projects:read", "projects:write"]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<String>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: BTreeSet::new(),
        }
    }

    /// Add a typed permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission.to_string());
    }

    /// Add a raw capability string to the set.
    pub fn insert(&mut self, capability: impl Into<String>) {
        self.permissions.insert(capability.into());
    }

    /// Check if the set contains a capability.
    pub fn has(&self, capability: &str) -> bool {
        self.permissions.contains(capability)
    }

    /// Check if the set contains every required capability.
    ///
    /// An empty requirement is always satisfied.
    pub fn has_all<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|p| self.has(p.as_ref()))
    }

    /// Check if this set contains all capabilities of another set.
    pub fn contains_all(&self, other: &PermissionSet) -> bool {
        self.permissions.is_superset(&other.permissions)
    }

    /// Iterate over the capability strings in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Typed view of the capabilities this gateway understands.
    pub fn typed(&self) -> Vec<Permission> {
        self.iter().filter_map(Permission::from_string).collect()
    }

    /// Capability strings as an owned list (for claims and API payloads).
    pub fn to_vec(&self) -> Vec<String> {
        self.permissions.iter().cloned().collect()
    }

    /// Get the count of capabilities.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Create from a list of capability strings.
    pub fn from_strings<S: AsRef<str>>(perms: &[S]) -> Self {
        perms.iter().map(|p| p.as_ref().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        for perm in iter {
            set.add(perm);
        }
        set
    }
}

impl FromIterator<String> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

/// Authorization check: the caller must hold every required capability.
///
/// This is a conjunction. A request needing two capabilities must have both;
/// an empty requirement list means the operation is unrestricted.
pub fn has_permission<S: AsRef<str>>(granted: &PermissionSet, required: &[S]) -> bool {
    granted.has_all(required)
}
