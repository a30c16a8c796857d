//! Claims embedded in signed gateway tokens.
//!
//! A signed token is self-contained: it carries the credential id, kind,
//! capability list, issue time and optional expiry, so any holder of the
//! server secret can verify it without consulting the credential store.

use chrono::{DateTime, Utc};
use gateway_rbac::{CredentialKind, PermissionSet};
use serde::{Deserialize, Serialize};

/// Claims for a gateway credential token.
///
/// # Example
///
/// ```rust
/// use gateway_auth::claims::TokenClaims;
/// use gateway_rbac::CredentialKind;
///
/// let claims = TokenClaims::new("cred_123", "mcp-gateway", CredentialKind::Team, None);
/// assert!(claims.permissions.contains(&"projects:write".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Subject (credential id)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp); absent for non-expiring credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Credential kind
    pub kind: CredentialKind,

    /// Capabilities granted by this token
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Operator-supplied description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TokenClaims {
    /// Create claims for a credential of the given kind, issued now.
    pub fn new(
        id: impl Into<String>,
        issuer: impl Into<String>,
        kind: CredentialKind,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self::issued_at(id, issuer, kind, Utc::now(), expires_at)
    }

    /// Create claims with an explicit issue time.
    pub fn issued_at(
        id: impl Into<String>,
        issuer: impl Into<String>,
        kind: CredentialKind,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            sub: id.into(),
            iss: issuer.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.map(|t| t.timestamp()),
            kind,
            permissions: kind.permissions().to_vec(),
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Issue time as DateTime.
    pub fn issued_at_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// Expiration as DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Capabilities carried by the token, exactly as embedded.
    pub fn permission_set(&self) -> PermissionSet {
        PermissionSet::from_strings(&self.permissions)
    }

    /// Check if the token is expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| now.timestamp() >= exp)
    }
}
