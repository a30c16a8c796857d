//! # Gateway Authentication
//!
//! This crate issues, verifies, revokes and garbage-collects the bearer
//! credentials presented to the MCP gateway.
//!
//! ## Overview
//!
//! The gateway-auth crate handles:
//! - **Issuance**: Signed, self-contained tokens with an optional ttl
//! - **Verification**: Revocation set, then direct store, then signature
//! - **Revocation**: Append-only set of strings that never verify again
//! - **Provisioning**: Static credentials loaded from configuration
//! - **Sweeping**: Periodic removal of expired records
//!
//! ## Usage
//!
//! ```rust
//! use gateway_auth::{AuthConfig, AuthManager};
//! use gateway_rbac::CredentialKind;
//!
//! let manager = AuthManager::new(AuthConfig::new("a-secret-of-at-least-16-bytes")).unwrap();
//!
//! let issued = manager.issue(CredentialKind::Team, Some("2h"), None).unwrap();
//! let record = manager.verify(&issued.token).into_record().unwrap();
//! assert_eq!(record.kind, CredentialKind::Team);
//!
//! assert!(manager.revoke(&issued.token));
//! assert!(!manager.verify(&issued.token).is_valid());
//! ```
//!
//! ## Security note
//!
//! A correctly signed token that was never stored is accepted with the
//! capabilities embedded in its own claims. Such tokens are only rejected
//! once their exact string has been revoked.

pub mod claims;
pub mod duration;
pub mod error;
pub mod jwt;
pub mod manager;
pub mod record;

pub use claims::TokenClaims;
pub use duration::parse_duration;
pub use error::{AuthError, AuthResult};
pub use jwt::{JwtConfig, JwtService};
pub use manager::{
    fingerprint, AuthConfig, AuthManager, IssuedCredential, RejectReason, Verification,
    DEFAULT_ISSUER, DEFAULT_SWEEP_INTERVAL,
};
pub use record::{CredentialRecord, CredentialSource};
