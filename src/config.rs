use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    MySql,
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub seed_demo_data: bool,
    pub demo_password: String,
    pub log_dir: String,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value `{raw}`: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let storage = match env::var("STORAGE").as_deref() {
            Ok("memory") => StorageKind::Memory,
            Ok("mysql") | Err(_) => StorageKind::MySql,
            Ok(other) => bail!("STORAGE must be `mysql` or `memory`, got `{other}`"),
        };

        let database_url = match storage {
            StorageKind::MySql => Some(env::var("DATABASE_URL").context("DATABASE_URL must be set")?),
            StorageKind::Memory => env::var("DATABASE_URL").ok(),
        };

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            storage,
            database_url,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: var_or("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,

            seed_demo_data: var_or("SEED_DEMO_DATA", storage == StorageKind::Memory)?,
            demo_password: env::var("DEMO_PASSWORD").unwrap_or_else(|_| "password123".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    /// In-memory configuration with a throwaway signing key.
    pub fn in_memory() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            storage: StorageKind::Memory,
            database_url: None,
            jwt_secret: uuid::Uuid::new_v4().to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 604_800,
            rate_login_per_min: 60,
            rate_protected_per_min: 1000,
            seed_demo_data: false,
            demo_password: "password123".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}
