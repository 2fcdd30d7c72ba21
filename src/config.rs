use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub ai_api_key: String,
    pub ai_base_url: String,
    pub ai_chat_model: String,
    pub ai_embedding_model: String,
    pub ai_timeout_secs: u64,
    pub storage_root: String,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub request_timeout_secs: u64,
    pub ai_route_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            jwt_secret: get_env("JWT_SECRET")?,
            ai_api_key: get_env("AI_API_KEY")?,
            ai_base_url: get_env_or("AI_BASE_URL", "https://api.openai.com/v1"),
            ai_chat_model: get_env_or("AI_CHAT_MODEL", "gpt-4o"),
            ai_embedding_model: get_env_or("AI_EMBEDDING_MODEL", "text-embedding-3-small"),
            ai_timeout_secs: get_env_parse_or("AI_TIMEOUT_SECS", 120)?,
            storage_root: get_env_or("STORAGE_ROOT", "./storage"),
            rate_limit_requests: get_env_parse_or("RATE_LIMIT_REQUESTS", 100)?,
            rate_limit_window_secs: get_env_parse_or("RATE_LIMIT_WINDOW_SECS", 60)?,
            request_timeout_secs: get_env_parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            ai_route_timeout_secs: get_env_parse_or("AI_ROUTE_TIMEOUT_SECS", 120)?,
            max_upload_bytes: get_env_parse_or("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
            cors_allowed_origins: get_env_list("CORS_ALLOWED_ORIGINS"),
        })
    }

    /// Settings for local runs and tests: memory store, generous limits.
    pub fn for_tests(jwt_secret: &str, storage_root: &str) -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            ai_api_key: "sk-test".to_string(),
            ai_base_url: "http://127.0.0.1:9".to_string(),
            ai_chat_model: "gpt-4o".to_string(),
            ai_embedding_model: "text-embedding-3-small".to_string(),
            ai_timeout_secs: 5,
            storage_root: storage_root.to_string(),
            rate_limit_requests: 1_000,
            rate_limit_window_secs: 60,
            request_timeout_secs: 30,
            ai_route_timeout_secs: 30,
            max_upload_bytes: 5 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn ai_route_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_route_timeout_secs.max(1))
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
