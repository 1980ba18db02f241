//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};

use taskflow_auth::token::MIN_SECRET_BYTES;
use taskflow_observability::LogFormat;

const DEV_SECRET: &str = "taskflow-dev-secret-do-not-use-in-production!";
const DEFAULT_TTL_MS: u64 = 3_600_000;
const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_ARGON2_M_COST: u32 = 19_456;
const DEFAULT_ARGON2_T_COST: u32 = 2;

/// Administrator account created or promoted at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub admin: Option<AdminBootstrap>,
    pub argon2_m_cost: u32,
    pub argon2_t_cost: u32,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("log_format", &self.log_format)
            .field("admin", &self.admin)
            .field("argon2_m_cost", &self.argon2_m_cost)
            .field("argon2_t_cost", &self.argon2_t_cost)
            .finish()
    }
}

impl AppConfig {
    /// Defaults around an explicit secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_format: LogFormat::default(),
            admin: None,
            argon2_m_cost: DEFAULT_ARGON2_M_COST,
            argon2_t_cost: DEFAULT_ARGON2_T_COST,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `LOG_FORMAT` alone, so logging can start before the rest is loaded.
    pub fn log_format_from_env() -> anyhow::Result<LogFormat> {
        log_format_from(&|key: &str| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
            None => bail!("JWT_SECRET must be set"),
        };
        if jwt_secret.len() < MIN_SECRET_BYTES {
            bail!("JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes");
        }

        let ttl_ms = parse_or(&var, "JWT_EXPIRATION_MS", DEFAULT_TTL_MS)?;
        if ttl_ms < 1_000 {
            bail!("JWT_EXPIRATION_MS must be at least 1000");
        }

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let log_format = log_format_from(&var)?;

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            jwt_secret,
            jwt_ttl: Duration::from_millis(ttl_ms),
            bind_addr,
            log_format,
            admin,
            argon2_m_cost: parse_or(&var, "ARGON2_M_COST", DEFAULT_ARGON2_M_COST)?,
            argon2_t_cost: parse_or(&var, "ARGON2_T_COST", DEFAULT_ARGON2_T_COST)?,
        })
    }
}

fn log_format_from(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<LogFormat> {
    match var("LOG_FORMAT") {
        Some(raw) => raw.parse::<LogFormat>().context("invalid LOG_FORMAT"),
        None => Ok(LogFormat::default()),
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw.trim().parse::<T>().with_context(|| format!("{key} is not a valid number")),
        None => Ok(default),
    }
}
