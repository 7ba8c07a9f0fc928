use std::{fmt, time::Duration};

use anyhow::bail;
use tracing::warn;

/// Signing key used when no `JWT_SECRET` is configured in development
/// without a database. Tokens signed with it are forgeable by anyone who has
/// read this file.
pub const DEV_JWT_SECRET: &str = "insecure-development-secret-change-me";

pub const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 7;
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Unset means development. Anything unrecognised is an error.
    fn parse(raw: Option<&str>) -> anyhow::Result<Self> {
        let Some(raw) = raw.map(|v| v.trim().to_ascii_lowercase()) else {
            return Ok(Environment::Development);
        };
        match raw.as_str() {
            "" | "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("unknown APP_ENV {other:?}; expected development or production"),
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// Argon2 work factor.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub store_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = Environment::parse(get("APP_ENV").as_deref())?;
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL");
        if database_url.is_none() && environment == Environment::Production {
            bail!("DATABASE_URL must be set when APP_ENV=production");
        }

        // the fallback key is only acceptable when nothing is persisted
        let secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == Environment::Production => {
                bail!("JWT_SECRET must be set when APP_ENV=production")
            }
            None if database_url.is_some() => {
                bail!("JWT_SECRET must be set when DATABASE_URL is configured")
            }
            None => {
                warn!("JWT_SECRET not set; using the insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes = parse_or(&get, "JWT_TTL_MINUTES", DEFAULT_TTL_MINUTES);
        if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {ttl_minutes}");
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&get, "PASSWORD_MEMORY_KIB", defaults.memory_kib),
            iterations: parse_or(&get, "PASSWORD_ITERATIONS", defaults.iterations),
            parallelism: parse_or(&get, "PASSWORD_PARALLELISM", defaults.parallelism),
        };

        Ok(Self {
            environment,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "APP_PORT", 3000),
            database_url,
            jwt: JwtConfig {
                secret,
                issuer: get("JWT_ISSUER").unwrap_or_else(|| "around".into()),
                audience: get("JWT_AUDIENCE").unwrap_or_else(|| "around-users".into()),
                ttl_minutes,
            },
            password,
            store_timeout_ms: parse_or(&get, "STORE_TIMEOUT_MS", 5_000),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_or<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key).and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
impl AppConfig {
    /// Development config with a cheap hash cost so tests stay fast.
    pub fn for_tests() -> Self {
        Self {
            environment: Environment::Development,
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test".into(),
                audience: "test-users".into(),
                ttl_minutes: 5,
            },
            password: PasswordConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            store_timeout_ms: 1_000,
        }
    }
}
