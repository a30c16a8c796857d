//! # Credential Kinds
//!
//! Every credential is issued as one of three kinds, and the kind alone
//! determines its capability set: `master ⊇ team ⊇ readonly`, with the
//! administrative capabilities held only by `master`.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::permissions::{Permission, PermissionSet};
use crate::resources::ResourceType;

/// Kind of an issued credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Full access including token and connection administration.
    Master,
    /// Read and write access to every backend entity.
    Team,
    /// Read-only access to every backend entity.
    Readonly,
}

impl CredentialKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Master => "master",
            CredentialKind::Team => "team",
            CredentialKind::Readonly => "readonly",
        }
    }

    /// Parse a kind from its string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "master" => Some(CredentialKind::Master),
            "team" => Some(CredentialKind::Team),
            "readonly" | "read-only" | "read_only" => Some(CredentialKind::Readonly),
            _ => None,
        }
    }

    /// Get all kinds, most privileged first.
    pub fn all() -> [CredentialKind; 3] {
        [
            CredentialKind::Master,
            CredentialKind::Team,
            CredentialKind::Readonly,
        ]
    }

    /// The fixed capability set for this kind.
    ///
    /// # Example
    ///
    /// ```
    /// use gateway_rbac::CredentialKind;
    ///
    /// let team = CredentialKind::Team.permissions();
    /// assert!(team.has("projects:write"));
    /// assert!(!team.has("tokens:manage"));
    /// ```
    pub fn permissions(&self) -> PermissionSet {
        let entities = ResourceType::entities().iter().copied();
        match self {
            CredentialKind::Readonly => entities
                .map(|r| Permission::new(r, Action::Read))
                .collect(),
            CredentialKind::Team => entities
                .flat_map(|r| [Permission::new(r, Action::Read), Permission::new(r, Action::Write)])
                .collect(),
            CredentialKind::Master => {
                let mut set = CredentialKind::Team.permissions();
                set.add(Permission::new(ResourceType::Token, Action::Manage));
                set.add(Permission::new(ResourceType::Connection, Action::Manage));
                set
            }
        }
    }

    /// Whether this kind carries administrative capabilities.
    pub fn is_administrative(&self) -> bool {
        matches!(self, CredentialKind::Master)
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown credential kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_monotonic() {
        let master = CredentialKind::Master.permissions();
        let team = CredentialKind::Team.permissions();
        let readonly = CredentialKind::Readonly.permissions();

        assert!(master.contains_all(&team));
        assert!(team.contains_all(&readonly));
        assert!(!readonly.contains_all(&team));
        assert!(!team.contains_all(&master));
    }

    #[test]
    fn test_only_master_is_administrative() {
        for kind in CredentialKind::all() {
            let admin = kind.permissions().typed().iter().any(|p| p.is_administrative());
            assert_eq!(admin, kind.is_administrative(), "kind {}", kind);
        }
        assert!(CredentialKind::Master.permissions().has("tokens:manage"));
        assert!(CredentialKind::Master.permissions().has("connections:manage"));
    }

    #[test]
    fn test_readonly_has_no_writes() {
        let readonly = CredentialKind::Readonly.permissions();
        assert_eq!(readonly.len(), ResourceType::entities().len());
        assert!(readonly.typed().iter().all(|p| p.action.is_read_only()));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(CredentialKind::parse("MASTER"), Some(CredentialKind::Master));
        assert_eq!(CredentialKind::parse("read-only"), Some(CredentialKind::Readonly));
        assert_eq!("team".parse::<CredentialKind>(), Ok(CredentialKind::Team));
        assert!("guest".parse::<CredentialKind>().is_err());
        assert_eq!(CredentialKind::parse("admin"), None);
    }
}
