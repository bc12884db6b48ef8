use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_POOL_SIZE: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide settings, built once at startup and handed to whoever needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub database_name: Option<String>,
    pub max_pool_size: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::Invalid {
                key: "NODE_ENV",
                value: other.to_string(),
            }),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(name)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("NODE_ENV") {
            Some(v) => Environment::parse(v.trim())?,
            None => Environment::Development,
        };

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let uri = get("MONGO_URI").ok_or(ConfigError::Missing("MONGO_URI"))?;

        let database = DatabaseConfig {
            uri,
            database_name: get("MONGO_DB_NAME"),
            max_pool_size: parse_or("MONGO_MAX_POOL_SIZE", get("MONGO_MAX_POOL_SIZE"), DEFAULT_MAX_POOL_SIZE)?,
            connect_timeout_secs: parse_or(
                "MONGO_CONNECT_TIMEOUT_SECS",
                get("MONGO_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };

        let api = ApiConfig {
            max_body_bytes: parse_or("API_MAX_BODY_BYTES", get("API_MAX_BODY_BYTES"), DEFAULT_MAX_BODY_BYTES)?,
        };

        Ok(Self {
            environment,
            port,
            database,
            api,
        })
    }

    /// Configuration for in-process servers that never reach a real database.
    pub fn for_tests(environment: Environment) -> Self {
        Self {
            environment,
            port: 0,
            database: DatabaseConfig {
                uri: "mongodb://localhost:27017/videohub_test".to_string(),
                database_name: None,
                max_pool_size: DEFAULT_MAX_POOL_SIZE,
                connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            api: ApiConfig {
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}
