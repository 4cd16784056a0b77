//! Process configuration, read from the environment (and `.env`)

use anyhow::{bail, Context};
use std::env;
use tracing::info;

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_JWT_TTL_MINUTES: i64 = 24 * 60;
const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// In-memory store when unset
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    /// Only the server needs it; see [`Config::jwt_secret`]
    jwt_secret: Option<String>,
    pub jwt_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT)?,
            database_url: optional("DATABASE_URL"),
            nats_url: optional("NATS_URL"),
            jwt_secret: optional("JWT_SECRET"),
            jwt_ttl_minutes: parse_or("JWT_TTL_MINUTES", DEFAULT_JWT_TTL_MINUTES)?,
        })
    }

    pub fn bind_addr(&self) -> String { format!("0.0.0.0:{}", self.port) }

    /// For commands that must write to the real catalog rather than a
    /// throwaway in-memory store.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url.as_deref().context("DATABASE_URL must be set for this command")
    }

    pub fn jwt_secret(&self) -> anyhow::Result<&[u8]> {
        let secret = self.jwt_secret.as_deref().context("JWT_SECRET must be set")?;
        if secret.len() < MIN_SECRET_LEN {
            bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters long");
        }
        Ok(secret.as_bytes())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database", &self.database_url.is_some())
            .field("nats", &self.nats_url.is_some())
            .field("jwt_ttl_minutes", &self.jwt_ttl_minutes)
            .finish_non_exhaustive()
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid {key} value '{raw}'")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        env::set_var("POSTER_SHOP_TEST_BAD_PORT", "eighty");
        assert!(parse_or::<u16>("POSTER_SHOP_TEST_BAD_PORT", 1).is_err());
        assert_eq!(parse_or::<u16>("POSTER_SHOP_TEST_UNSET_PORT", 7).unwrap(), 7);
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = Config { port: 1, database_url: None, nats_url: None, jwt_secret: None, jwt_ttl_minutes: 1 };
        assert!(config.jwt_secret().is_err());
        config.jwt_secret = Some("short".into());
        assert!(config.jwt_secret().is_err());
        config.jwt_secret = Some("x".repeat(MIN_SECRET_LEN));
        assert!(config.jwt_secret().is_ok());
    }

    #[test]
    fn test_import_needs_a_database() {
        let mut config = Config { port: 1, database_url: None, nats_url: None, jwt_secret: None, jwt_ttl_minutes: 1 };
        assert!(config.require_database_url().is_err());
        config.database_url = Some("postgres://localhost/shop".into());
        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/shop");
    }
}
