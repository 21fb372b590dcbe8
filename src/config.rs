use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Argon2 work factor. `None` keeps the argon2 crate default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub check_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").unwrap_or_default();
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must be set to a non-empty value");
        }

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                5,
            )?),
            check_interval: Duration::from_secs(parse_or(
                &lookup,
                "DATABASE_CHECK_INTERVAL_SECS",
                5,
            )?),
        };
        if database.check_interval.is_zero() {
            bail!("DATABASE_CHECK_INTERVAL_SECS must be positive");
        }

        let jwt = JwtConfig {
            secret,
            ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 72)?,
        };
        if jwt.ttl_hours <= 0 {
            bail!("JWT_TTL_HOURS must be positive");
        }

        let password = PasswordConfig {
            memory_kib: parse_opt(&lookup, "PASSWORD_HASH_MEMORY_KIB")?,
            iterations: parse_opt(&lookup, "PASSWORD_HASH_ITERATIONS")?,
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            database,
            jwt,
            password,
        })
    }
}

fn parse_opt<F, T>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        _ => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}
