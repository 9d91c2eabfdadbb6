//! Runtime configuration
//!
//! Defaults work for a local setup (Postgres on localhost, Ollama on its
//! stock port); every field can be overridden through the environment.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration
    pub server: ServerSettings,

    /// Database connection configuration
    pub database: DatabaseSettings,

    /// Completion model configuration
    pub llm: LlmSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,

    /// Port
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// tokio-postgres connection string
    pub url: String,

    /// Schema searched for base tables
    pub schema: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Ollama server base URL
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Completion attempts before giving up
    pub max_retries: usize,

    /// Fixed delay between attempts (milliseconds)
    pub retry_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "host=localhost user=postgres dbname=analytics".to_string(),
            schema: "public".to_string(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl ServiceConfig {
    /// Build a configuration from defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        config.server.port = env_parsed("PORT", config.server.port);

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(schema) = std::env::var("DATABASE_SCHEMA") {
            config.database.schema = schema;
        }

        if let Ok(base_url) = std::env::var("OLLAMA_URL") {
            config.llm.base_url = base_url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        config.llm.max_retries = env_parsed("LLM_MAX_RETRIES", config.llm.max_retries);
        config.llm.retry_delay_ms = env_parsed("LLM_RETRY_DELAY_MS", config.llm.retry_delay_ms);

        config
    }
}

/// Parse an env var, keeping the default on absence or a malformed value
fn env_parsed<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring non-numeric {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
