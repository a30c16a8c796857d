//! JWT token signing and validation
//!
//! This module signs and verifies gateway tokens using the jsonwebtoken crate
//! with a server-wide HMAC secret.

use crate::claims::TokenClaims;
use crate::error::{AuthError, AuthResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Minimum accepted secret length in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Every gateway token is HMAC-SHA256 signed.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT configuration for token signing and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,

    /// Token issuer
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// Create a configuration with HS256 and the given issuer.
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
        }
    }
}

/// JWT service for token operations.
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration.
    ///
    /// Fails with a configuration error when the secret is too short.
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::ConfigError(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Sign claims into a compact token string.
    pub fn encode_claims(&self, claims: &TokenClaims) -> AuthResult<String> {
        let header = Header::new(ALGORITHM);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(format!("Token encoding failed: {}", e)))
    }

    /// Validate signature, issuer and expiry, then decode the claims.
    ///
    /// Tokens without an `exp` claim are accepted as non-expiring.
    pub fn validate_token(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&self.config.issuer]);
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Malformed token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidToken("Invalid issuer".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;

        Ok(token_data.claims)
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gateway_rbac::CredentialKind;

    fn test_secret() -> String {
        "test-secret-key-for-jwt-signing-minimum-32-chars".to_string()
    }

    fn service() -> JwtService {
        JwtService::new(JwtConfig::new(test_secret(), "mcp-gateway")).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = JwtService::new(JwtConfig::new("short", "mcp-gateway"));
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_token_generation_and_validation() {
        let service = service();
        let claims = TokenClaims::new("cred_abc", "mcp-gateway", CredentialKind::Team, None);

        let token = service.encode_claims(&claims).unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_invalid_token() {
        let result = service().validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtService::new(JwtConfig::new("another-secret-of-enough-length", "mcp-gateway"))
            .unwrap();
        let claims = TokenClaims::new("cred_abc", "mcp-gateway", CredentialKind::Master, None);
        let token = other.encode_claims(&claims).unwrap();

        assert!(matches!(
            service().validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let service = service();
        let claims = TokenClaims::new("cred_abc", "someone-else", CredentialKind::Team, None);
        let token = service.encode_claims(&claims).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let claims = TokenClaims::new("cred_abc", "mcp-gateway", CredentialKind::Master, None);
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(test_secret().as_bytes()),
        )
        .unwrap();

        assert_eq!(decode_header_alg(&service().encode_claims(&claims).unwrap()), Algorithm::HS256);
        assert!(matches!(
            service().validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    fn decode_header_alg(token: &str) -> Algorithm {
        jsonwebtoken::decode_header(token).unwrap().alg
    }

    #[test]
    fn test_expired_token() {
        let service = service();
        let past = Utc::now() - Duration::hours(2);
        let claims = TokenClaims::issued_at(
            "cred_old",
            "mcp-gateway",
            CredentialKind::Readonly,
            past,
            Some(past + Duration::hours(1)),
        );
        let token = service.encode_claims(&claims).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }
}
