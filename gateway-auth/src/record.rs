//! Credential records.

use chrono::{DateTime, Utc};
use gateway_rbac::{has_permission, CredentialKind, PermissionSet};
use serde::{Deserialize, Serialize};

use crate::claims::TokenClaims;

/// How a credential came into existence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Generated by `AuthManager::issue`.
    Issued,
    /// Provisioned from external configuration at startup.
    Static,
    /// Synthesized from a verified signed token that is not in the store.
    Signed,
}

/// One issued bearer credential.
///
/// The capability set is fixed at issuance and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Opaque identifier, distinct from the credential string
    pub id: String,

    /// Kind of the credential
    pub kind: CredentialKind,

    /// Capabilities granted
    pub permissions: PermissionSet,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Expiry, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Last successful verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,

    /// Operator-supplied description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Origin of the record
    pub source: CredentialSource,
}

impl CredentialRecord {
    /// Build a record for a new credential of the given kind.
    pub fn new(
        id: impl Into<String>,
        kind: CredentialKind,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        description: Option<String>,
        source: CredentialSource,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            permissions: kind.permissions(),
            created_at,
            expires_at,
            last_used_at: None,
            description,
            source,
        }
    }

    /// Synthesize a transient record from verified token claims.
    ///
    /// The capabilities are taken verbatim from the claims rather than
    /// recomputed from the kind.
    pub fn from_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Self {
        Self {
            id: claims.sub.clone(),
            kind: claims.kind,
            permissions: claims.permission_set(),
            created_at: claims.issued_at_time(),
            expires_at: claims.expires_at(),
            last_used_at: Some(now),
            description: claims.description.clone(),
            source: CredentialSource::Signed,
        }
    }

    /// Check if the record is expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Check if the record holds every required capability.
    pub fn has_permission<S: AsRef<str>>(&self, required: &[S]) -> bool {
        has_permission(&self.permissions, required)
    }
}
