//! Environment configuration.

use std::time::Duration;

use thiserror::Error;

use crate::payment::StripeConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where caller identities come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Identity service base URL (`IDENTITY_URL`).
    Remote(String),
    /// Static token table (`IDENTITY_TOKENS`).
    Static(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub nats_subject_prefix: String,
    pub stripe: StripeConfig,
    pub payment_currency: String,
    pub identity: IdentitySource,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// - `DATABASE_URL`: required
    /// - `PORT`: default 8083
    /// - `NATS_URL`: optional; events are only logged without it
    /// - `NATS_SUBJECT_PREFIX`: default `orders`
    /// - `STRIPE_SECRET_KEY`: required
    /// - `STRIPE_API_BASE`: default `https://api.stripe.com`
    /// - `GATEWAY_TIMEOUT_SECS`: default 30, also used for identity lookups
    /// - `PAYMENT_CURRENCY`: default `usd`
    /// - `IDENTITY_URL` or `IDENTITY_TOKENS`: one is required
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid { name: "PORT", reason: e.to_string() })?,
            None => 8083,
        };
        let timeout_secs = match var("GATEWAY_TIMEOUT_SECS") {
            Some(t) => t.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid { name: "GATEWAY_TIMEOUT_SECS", reason: e.to_string() })?,
            None => 30,
        };
        let stripe = StripeConfig {
            secret_key: var("STRIPE_SECRET_KEY").ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            api_base: var("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };
        let identity = match (var("IDENTITY_URL"), var("IDENTITY_TOKENS")) {
            (Some(url), _) => IdentitySource::Remote(url),
            (None, Some(tokens)) => IdentitySource::Static(tokens),
            (None, None) => return Err(ConfigError::Missing("IDENTITY_URL or IDENTITY_TOKENS")),
        };

        Ok(Self {
            database_url,
            port,
            nats_url: var("NATS_URL"),
            nats_subject_prefix: var("NATS_SUBJECT_PREFIX").unwrap_or_else(|| "orders".to_string()),
            stripe,
            payment_currency: var("PAYMENT_CURRENCY").unwrap_or_else(|| "usd".to_string()).to_lowercase(),
            identity,
        })
    }
}
