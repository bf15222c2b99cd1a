pub mod server;

use anyhow::Result;
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: String,
    pub app_host: String,
    pub app_port: u16,
    pub log_level: String,
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables, loading a `.env` file
    /// first if one is present. Panics at boot with a descriptive message
    /// when a required variable is missing or malformed, matching the
    /// fail-fast posture the rest of the process depends on.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            app_host: env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            app_port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("APP_PORT must be a valid port number"),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            redis_url: env::var("REDIS_URL")
                .expect("REDIS_URL environment variable is required"),
        })
    }
}
