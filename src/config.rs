use std::env;
use std::time::Duration;

use chrono::FixedOffset;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub backend: BackendConfig,
    /// Offset used to decide which calendar day a timestamp belongs to.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub orders_path: String,
    pub users_path: String,
    pub stats_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_millis(10_000),
            max_retries: 2,
            retry_backoff: Duration::from_millis(200),
            orders_path: "/orders".to_string(),
            users_path: "/users".to_string(),
            stats_path: "/finance/stats".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = BackendConfig::default();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            backend: BackendConfig {
                base_url: env::var("BACKEND_URL").unwrap_or(defaults.base_url),
                timeout: Duration::from_millis(parse_or_default("BACKEND_TIMEOUT_MS", 10_000)?),
                max_retries: parse_or_default("BACKEND_MAX_RETRIES", defaults.max_retries)?,
                retry_backoff: Duration::from_millis(parse_or_default(
                    "BACKEND_RETRY_BACKOFF_MS",
                    200,
                )?),
                orders_path: env::var("BACKEND_ORDERS_PATH").unwrap_or(defaults.orders_path),
                users_path: env::var("BACKEND_USERS_PATH").unwrap_or(defaults.users_path),
                stats_path: env::var("BACKEND_STATS_PATH").unwrap_or(defaults.stats_path),
            },
            utc_offset_minutes: parse_or_default("UTC_OFFSET_MINUTES", 300)?,
        };

        config.utc_offset()?;
        Ok(config)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            AppError::Internal(format!(
                "invalid UTC_OFFSET_MINUTES: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
