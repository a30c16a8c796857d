//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, so the binary can be
//! configured entirely from the environment in container deployments.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use gateway_auth::{AuthConfig, DEFAULT_ISSUER};
use gateway_rbac::CredentialKind;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Plain,
    /// One JSON object per line
    Json,
}

/// An operator-provisioned credential: `kind:token[:description]`.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticToken {
    /// Kind granted to the token
    pub kind: CredentialKind,
    /// The credential string
    pub token: String,
    /// Optional label
    pub description: Option<String>,
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken")
            .field("kind", &self.kind)
            .field("token", &"[REDACTED]")
            .field("description", &self.description)
            .finish()
    }
}

impl FromStr for StaticToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, ':');
        let kind: CredentialKind = parts.next().unwrap_or_default().parse()?;
        let token = parts
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "expected kind:token[:description]".to_string())?;
        let description = parts.next().filter(|d| !d.is_empty()).map(str::to_string);

        Ok(Self {
            kind,
            token: token.to_string(),
            description,
        })
    }
}

/// Gateway server arguments.
#[derive(Parser)]
#[command(
    name = "mcp-gateway",
    version,
    about = "MCP gateway for the project-management backend"
)]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "MCP_GATEWAY_BIND", default_value = "127.0.0.1:3100")]
    pub bind: SocketAddr,

    /// Secret used to sign issued tokens (at least 16 bytes).
    #[arg(long, env = "MCP_GATEWAY_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Issuer claim of signed tokens.
    #[arg(long, env = "MCP_GATEWAY_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,

    /// Pre-provisioned credential, `kind:token[:description]`. Repeatable.
    #[arg(
        long = "static-token",
        env = "MCP_GATEWAY_STATIC_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub static_tokens: Vec<StaticToken>,

    /// Requests per minute per credential; 0 disables rate limiting.
    #[arg(long, env = "MCP_GATEWAY_RATE_LIMIT", default_value_t = 120)]
    pub rate_limit_per_minute: u32,

    /// Log output format.
    #[arg(long, env = "MCP_GATEWAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Args {
    /// Auth manager configuration.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.jwt_secret.clone()).with_issuer(self.issuer.clone())
    }

    /// Rate-limit window and budget, if enabled.
    pub fn rate_limit(&self) -> Option<(u32, Duration)> {
        (self.rate_limit_per_minute > 0)
            .then(|| (self.rate_limit_per_minute, Duration::from_secs(60)))
    }
}
