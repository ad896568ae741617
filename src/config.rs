use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DefaultAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact_no: String,
    pub address: String,
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_expire_days: i64,
    pub cookie_expire_days: i64,
    pub cookie_secure: bool,
    pub request_timeout: Duration,
    /// Argon2 work factor: memory in KiB and number of passes.
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub default_admin: Option<DefaultAdmin>,
}

// Keep the secret out of startup logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("jwt_expire_days", &self.jwt_expire_days)
            .field("cookie_expire_days", &self.cookie_expire_days)
            .field("cookie_secure", &self.cookie_secure)
            .field("request_timeout", &self.request_timeout)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field(
                "default_admin",
                &self.default_admin.as_ref().map(|a| a.email.as_str()),
            )
            .finish()
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let jwt_secret = var("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.trim().is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }

        let default_admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(DefaultAdmin {
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
                contact_no: var("ADMIN_CONTACT_NO").ok_or_else(|| {
                    anyhow!("ADMIN_CONTACT_NO must be set together with ADMIN_EMAIL")
                })?,
                address: var("ADMIN_ADDRESS").ok_or_else(|| {
                    anyhow!("ADMIN_ADDRESS must be set together with ADMIN_EMAIL")
                })?,
            }),
            (None, None) => None,
            _ => {
                warn!("Only one of ADMIN_EMAIL/ADMIN_PASSWORD set; skipping default admin");
                None
            }
        };

        Ok(Self {
            port: try_load("PORT", "5000")?,
            database_path: try_load("DATABASE_PATH", "zield.sqlite3")?,
            jwt_secret,
            jwt_expire_days: try_load("JWT_EXPIRE_DAYS", "30")?,
            cookie_expire_days: try_load("JWT_COOKIE_EXPIRE", "30")?,
            cookie_secure: try_load("COOKIE_SECURE", "false")?,
            request_timeout: Duration::from_secs(try_load("REQUEST_TIMEOUT_SECS", "30")?),
            hash_memory_kib: try_load("HASH_MEMORY_KIB", "19456")?,
            hash_iterations: try_load("HASH_ITERATIONS", "2")?,
            default_admin,
        })
    }

    /// Settings for tests and embedding: in-memory friendly defaults with an
    /// explicit secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: 5000,
            database_path: PathBuf::from(":memory:"),
            jwt_secret: jwt_secret.into(),
            jwt_expire_days: 30,
            cookie_expire_days: 30,
            cookie_secure: false,
            request_timeout: Duration::from_secs(30),
            hash_memory_kib: argon2::Params::DEFAULT_M_COST,
            hash_iterations: argon2::Params::DEFAULT_T_COST,
            default_admin: None,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw:?}"))
}
