//! Credential store, revocation set and the verification pipeline.
//!
//! The manager keeps issued records keyed by their token string for the
//! fast path and falls back to signature verification for tokens it has
//! never stored. Revocation is checked before either path.
//!
//! Signed tokens that never passed through the store are accepted on their
//! signature alone and carry whatever capabilities their claims embed. They
//! can only be rejected by revoking the exact token string.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use gateway_rbac::CredentialKind;
use parking_lot::RwLock;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::claims::TokenClaims;
use crate::duration::parse_duration;
use crate::error::{AuthError, AuthResult};
use crate::jwt::{JwtConfig, JwtService};
use crate::record::{CredentialRecord, CredentialSource};

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default token issuer.
pub const DEFAULT_ISSUER: &str = "mcp-gateway";

/// Configuration for the auth manager.
#[derive(Clone)]
pub struct AuthConfig {
    /// Server-wide signing secret
    pub secret: String,

    /// Issuer embedded in and required of signed tokens
    pub issuer: String,

    /// Interval of the background expiry sweep
    pub sweep_interval: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

impl AuthConfig {
    /// Create a configuration with the default issuer and sweep interval.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Why a credential failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The exact string was revoked
    Revoked,
    /// The stored record or the signed token has expired
    Expired,
    /// Not stored, and not a validly signed token
    Invalid,
}

/// Outcome of a verification attempt. Verification never fails with an error.
#[derive(Debug, Clone)]
pub enum Verification {
    /// The credential is valid
    Valid(CredentialRecord),
    /// The credential was rejected
    Rejected(RejectReason),
}

impl Verification {
    /// Check if the credential verified.
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }

    /// The verified record, if any.
    pub fn into_record(self) -> Option<CredentialRecord> {
        match self {
            Verification::Valid(record) => Some(record),
            Verification::Rejected(_) => None,
        }
    }

    /// Convert into a result, mapping every rejection to `AuthInvalid`.
    pub fn into_result(self) -> AuthResult<CredentialRecord> {
        self.into_record().ok_or(AuthError::AuthInvalid)
    }
}

/// A freshly issued credential.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// The bearer string handed to the client
    pub token: String,

    /// The stored record
    pub record: CredentialRecord,
}

/// Short, non-reversible identifier of a token for log output.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().take(6).map(|b| format!("{:02x}", b)).collect()
}

fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("cred_{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Issues, verifies, revokes and garbage-collects credentials.
///
/// Every operation completes its map mutation under a short synchronous
/// lock; nothing here awaits while holding state.
pub struct AuthManager {
    jwt: JwtService,
    config: AuthConfig,
    store: RwLock<HashMap<String, CredentialRecord>>,
    revoked: RwLock<HashSet<String>>,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("config", &self.config)
            .field("stored", &self.store.read().len())
            .field("revoked", &self.revoked.read().len())
            .finish()
    }
}

impl AuthManager {
    /// Create a manager. Fails if the signing secret is unusable.
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let jwt = JwtService::new(JwtConfig::new(config.secret.clone(), config.issuer.clone()))?;

        Ok(Self {
            jwt,
            config,
            store: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issue a new credential of `kind`.
    ///
    /// `ttl` uses the `<integer><s|m|h|d>` syntax; `None` means non-expiring.
    pub fn issue(
        &self,
        kind: CredentialKind,
        ttl: Option<&str>,
        description: Option<String>,
    ) -> AuthResult<IssuedCredential> {
        self.issue_at(kind, ttl, description, Utc::now())
    }

    /// Issue a credential as if the current time were `now`.
    pub fn issue_at(
        &self,
        kind: CredentialKind,
        ttl: Option<&str>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedCredential> {
        let expires_at = match ttl {
            Some(ttl) => {
                let lifetime = parse_duration(ttl)?;
                let lifetime = chrono::Duration::from_std(lifetime)
                    .map_err(|_| AuthError::InvalidDuration(ttl.to_string()))?;
                Some(
                    now.checked_add_signed(lifetime)
                        .ok_or_else(|| AuthError::InvalidDuration(ttl.to_string()))?,
                )
            }
            None => None,
        };

        let record = CredentialRecord::new(
            generate_id(),
            kind,
            now,
            expires_at,
            description,
            CredentialSource::Issued,
        );

        let claims =
            TokenClaims::issued_at(&record.id, &self.config.issuer, kind, now, expires_at)
                .with_description(record.description.clone());
        let token = self.jwt.encode_claims(&claims)?;

        self.store.write().insert(token.clone(), record.clone());

        info!(
            credential_id = %record.id,
            kind = %kind,
            expires_at = ?record.expires_at,
            "Issued credential"
        );

        Ok(IssuedCredential { token, record })
    }

    /// Store an externally configured credential string.
    ///
    /// Provisioned credentials never expire and are revocable like issued
    /// ones. Re-provisioning the same string replaces its record.
    pub fn provision(
        &self,
        token: impl Into<String>,
        kind: CredentialKind,
        description: Option<String>,
    ) -> CredentialRecord {
        let token = token.into();
        let record = CredentialRecord::new(
            generate_id(),
            kind,
            Utc::now(),
            None,
            description,
            CredentialSource::Static,
        );

        info!(
            credential_id = %record.id,
            kind = %kind,
            token = %fingerprint(&token),
            "Provisioned static credential"
        );

        self.store.write().insert(token, record.clone());
        record
    }

    /// Verify a presented credential string.
    pub fn verify(&self, token: &str) -> Verification {
        self.verify_at(token, Utc::now())
    }

    /// Verify as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Verification {
        if self.revoked.read().contains(token) {
            debug!(token = %fingerprint(token), "Rejected revoked credential");
            return Verification::Rejected(RejectReason::Revoked);
        }

        {
            let mut store = self.store.write();
            if let Some(record) = store.get_mut(token) {
                if record.is_expired_at(now) {
                    let id = record.id.clone();
                    store.remove(token);
                    debug!(credential_id = %id, "Purged expired credential");
                    return Verification::Rejected(RejectReason::Expired);
                }

                record.last_used_at = Some(now);
                return Verification::Valid(record.clone());
            }
        }

        match self.jwt.validate_token(token) {
            Ok(claims) if claims.is_expired_at(now) => {
                Verification::Rejected(RejectReason::Expired)
            }
            Ok(claims) => {
                debug!(credential_id = %claims.sub, "Accepted signed credential");
                Verification::Valid(CredentialRecord::from_claims(&claims, now))
            }
            Err(AuthError::TokenExpired) => Verification::Rejected(RejectReason::Expired),
            Err(e) => {
                debug!(token = %fingerprint(token), error = %e, "Rejected credential");
                Verification::Rejected(RejectReason::Invalid)
            }
        }
    }

    /// Revoke a credential string.
    ///
    /// The string is added to the revocation set unconditionally. Returns
    /// whether a stored record was removed.
    pub fn revoke(&self, token: &str) -> bool {
        self.revoked.write().insert(token.to_string());
        let removed = self.store.write().remove(token);

        match &removed {
            Some(record) => info!(credential_id = %record.id, "Revoked credential"),
            None => info!(token = %fingerprint(token), "Revoked unknown credential"),
        }

        removed.is_some()
    }

    /// All stored records that have not expired.
    pub fn list(&self) -> Vec<CredentialRecord> {
        self.list_at(Utc::now())
    }

    /// All stored records not expired at `now`, oldest first.
    pub fn list_at(&self, now: DateTime<Utc>) -> Vec<CredentialRecord> {
        let mut records: Vec<CredentialRecord> = self
            .store
            .read()
            .values()
            .filter(|r| !r.is_expired_at(now))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        records
    }

    /// Drop expired entries from the store. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Drop entries expired at `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut store = self.store.write();
        let before = store.len();
        store.retain(|_, record| !record.is_expired_at(now));
        let removed = before - store.len();

        if removed > 0 {
            info!(removed, remaining = store.len(), "Swept expired credentials");
        }
        removed
    }

    /// Number of stored records, expired or not.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Number of revoked strings.
    pub fn revoked_count(&self) -> usize {
        self.revoked.read().len()
    }

    /// Run `sweep` on the configured interval until the manager is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(manager) => {
                        manager.sweep();
                    }
                    None => {
                        warn!("Auth manager dropped, stopping credential sweeper");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const SECRET: &str = "test-secret-key-for-jwt-signing-minimum-32-chars";

    fn manager() -> AuthManager {
        AuthManager::new(AuthConfig::new(SECRET)).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let manager = manager();
        for kind in CredentialKind::all() {
            let issued = manager.issue(kind, Some("1h"), None).unwrap();
            let record = manager.verify(&issued.token).into_record().unwrap();

            assert_eq!(record.kind, kind);
            assert_eq!(record.permissions, kind.permissions());
            assert!(record.last_used_at.is_some());
            assert_eq!(record.source, CredentialSource::Issued);
        }
    }

    #[test]
    fn test_id_is_not_the_token() {
        let manager = manager();
        let issued = manager.issue(CredentialKind::Team, None, None).unwrap();

        assert!(issued.record.id.starts_with("cred_"));
        assert_ne!(issued.record.id, issued.token);
    }

    #[test]
    fn test_invalid_duration() {
        let manager = manager();
        let result = manager.issue(CredentialKind::Readonly, Some("5x"), None);

        assert!(matches!(result, Err(AuthError::InvalidDuration(_))));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let manager = manager();
        let issued = manager.issue(CredentialKind::Master, None, None).unwrap();

        assert!(manager.revoke(&issued.token));
        assert!(!manager.revoke(&issued.token));
        assert_eq!(manager.revoked_count(), 1);

        for _ in 0..2 {
            assert!(matches!(
                manager.verify(&issued.token),
                Verification::Rejected(RejectReason::Revoked)
            ));
        }
    }

    #[test]
    fn test_revoked_signature_path_stays_rejected() {
        let manager = manager();
        let issued = manager.issue(CredentialKind::Team, None, None).unwrap();

        // Drop the stored record so only the signature path could accept it.
        manager.store.write().clear();
        assert!(manager.verify(&issued.token).is_valid());

        manager.revoke(&issued.token);
        assert!(!manager.verify(&issued.token).is_valid());
    }

    #[test]
    fn test_ttl_expiry_purges_record() {
        let manager = manager();
        let now = Utc::now();
        let issued = manager
            .issue_at(CredentialKind::Readonly, Some("1s"), None, now)
            .unwrap();

        assert!(manager.verify_at(&issued.token, now).is_valid());
        assert_eq!(manager.list_at(now).len(), 1);

        let later = now + ChronoDuration::seconds(2);
        assert!(manager.list_at(later).is_empty());
        assert!(matches!(
            manager.verify_at(&issued.token, later),
            Verification::Rejected(RejectReason::Expired)
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_sweep_drops_only_expired() {
        let manager = manager();
        let now = Utc::now();
        manager
            .issue_at(CredentialKind::Team, Some("1m"), None, now)
            .unwrap();
        manager
            .issue_at(CredentialKind::Team, None, None, now)
            .unwrap();

        assert_eq!(manager.sweep_at(now + ChronoDuration::minutes(2)), 1);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_signed_token_yields_transient_record() {
        let manager = manager();
        let claims = TokenClaims::new("cred_external", DEFAULT_ISSUER, CredentialKind::Readonly, None);
        let token = manager.jwt.encode_claims(&claims).unwrap();

        let record = manager.verify(&token).into_record().unwrap();
        assert_eq!(record.id, "cred_external");
        assert_eq!(record.source, CredentialSource::Signed);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_garbage_is_invalid() {
        let manager = manager();
        assert!(matches!(
            manager.verify("not-a-token"),
            Verification::Rejected(RejectReason::Invalid)
        ));
        assert!(matches!(
            manager.verify("").into_result(),
            Err(AuthError::AuthInvalid)
        ));
    }

    #[test]
    fn test_provisioned_credential() {
        let manager = manager();
        manager.provision("static-team-token", CredentialKind::Team, Some("ci".into()));

        let record = manager.verify("static-team-token").into_record().unwrap();
        assert_eq!(record.kind, CredentialKind::Team);
        assert_eq!(record.source, CredentialSource::Static);
        assert_eq!(record.description.as_deref(), Some("ci"));
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let config = AuthConfig::new(SECRET).with_sweep_interval(Duration::from_secs(10));
        let manager = Arc::new(AuthManager::new(config).unwrap());

        let past = Utc::now() - ChronoDuration::hours(1);
        manager
            .issue_at(CredentialKind::Readonly, Some("1s"), None, past)
            .unwrap();
        assert_eq!(manager.len(), 1);

        let handle = manager.spawn_sweeper();
        tokio::time::sleep(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;

        assert!(manager.is_empty());
        handle.abort();
    }
}
