use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub routing_url: Option<String>,
    pub routing_timeout_ms: u64,
    pub pricing_table_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            routing_url: non_empty("ROUTING_URL"),
            routing_timeout_ms: parse_or_default("ROUTING_TIMEOUT_MS", 2500)?,
            pricing_table_path: non_empty("PRICING_TABLE_PATH"),
        }
        .validated()
    }

    fn validated(self) -> Result<Self, AppError> {
        if self.event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be greater than 0".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_millis(self.routing_timeout_ms)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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
