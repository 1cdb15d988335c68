//! Caller identity.
//!
//! Authentication itself lives in a separate identity service; this module only
//! resolves a bearer token into an [`Actor`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::value_objects::UserId;
use crate::{EcommerceError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "user")]
    Customer,
    Admin,
}

/// The authenticated caller of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Actor {
    pub fn customer(id: impl Into<String>) -> Self {
        Self { id: UserId::new(id), email: None, role: Role::Customer }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self { id: UserId::new(id), email: None, role: Role::Admin }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() { return Ok(()); }
        Err(EcommerceError::Forbidden("Admin access required".into()))
    }
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolves a bearer token. Unknown or expired tokens yield `Unauthorized`.
    async fn resolve(&self, token: &str) -> Result<Actor>;
}

/// Fixed token table, for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, Actor>,
}

impl StaticIdentity {
    pub fn new() -> Self { Self::default() }

    pub fn with_token(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }

    /// Parses `token=user_id:role[:email]` entries separated by `;`.
    pub fn parse(table: &str) -> std::result::Result<Self, String> {
        let mut identity = Self::new();
        for entry in table.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, rest) = entry.split_once('=').ok_or_else(|| format!("missing '=' in {entry:?}"))?;
            let mut parts = rest.splitn(3, ':');
            let id = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| format!("missing user id in {entry:?}"))?;
            let role = match parts.next().unwrap_or("customer") {
                "admin" => Role::Admin,
                "customer" | "user" => Role::Customer,
                other => return Err(format!("unknown role {other:?}")),
            };
            let email = parts.next().map(str::to_string);
            identity.tokens.insert(token.trim().to_string(), Actor { id: UserId::new(id), email, role });
        }
        Ok(identity)
    }
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn resolve(&self, token: &str) -> Result<Actor> {
        self.tokens.get(token).cloned().ok_or(EcommerceError::Unauthorized)
    }
}

/// Asks the identity service who owns a token via `GET {base}/me`.
#[derive(Debug, Clone)]
pub struct RemoteIdentity {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteIdentity {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EcommerceError::UpstreamError(format!("identity client: {e}")))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl IdentityService for RemoteIdentity {
    async fn resolve(&self, token: &str) -> Result<Actor> {
        let response = self.client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| EcommerceError::UpstreamError(format!("identity service unreachable: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            debug!(%status, "token rejected by identity service");
            return Err(EcommerceError::Unauthorized);
        }
        if !status.is_success() {
            return Err(EcommerceError::UpstreamError(format!("identity service returned {status}")));
        }
        response
            .json::<Actor>()
            .await
            .map_err(|e| EcommerceError::UpstreamError(format!("identity response: {e}")))
    }
}
