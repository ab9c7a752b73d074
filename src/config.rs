// src/config.rs
//! Service configuration from environment variables (loaded via dotenv in the
//! binary). Everything has a default so a bare `cargo run` works against the
//! bundled sample data.

use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_NUTRITION_API_URL: &str = "NUTRITION_API_URL";
pub const ENV_NUTRITION_TABLE_PATH: &str = "NUTRITION_TABLE_PATH";
pub const ENV_NUTRITION_CACHE_TTL_SECS: &str = "NUTRITION_CACHE_TTL_SECS";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_NUTRITION_TABLE_PATH: &str = "config/nutrition_table.json";
pub const DEFAULT_NUTRITION_CACHE_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// When set, nutrition lookups go to the hosted REST API; otherwise the
    /// local JSON table is used.
    pub nutrition_api_url: Option<String>,
    pub nutrition_table_path: PathBuf,
    pub nutrition_cache_ttl: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let nutrition_api_url = std::env::var(ENV_NUTRITION_API_URL)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let nutrition_table_path = std::env::var(ENV_NUTRITION_TABLE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_NUTRITION_TABLE_PATH));

        let ttl_secs = std::env::var(ENV_NUTRITION_CACHE_TTL_SECS)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_NUTRITION_CACHE_TTL_SECS);

        Self {
            bind_addr,
            nutrition_api_url,
            nutrition_table_path,
            nutrition_cache_ttl: Duration::from_secs(ttl_secs),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            nutrition_api_url: None,
            nutrition_table_path: PathBuf::from(DEFAULT_NUTRITION_TABLE_PATH),
            nutrition_cache_ttl: Duration::from_secs(DEFAULT_NUTRITION_CACHE_TTL_SECS),
        }
    }
}
