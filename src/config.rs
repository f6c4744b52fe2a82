//! Configuration Module
//!
//! Loads service configuration from a JSON file, falling back to defaults,
//! with a handful of environment variable overrides.

use std::env;
use std::path::{Path, PathBuf};

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Default config file consulted when `CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// File name of the persistent backend's record file inside the temp dir.
pub const DEFAULT_DATA_FILE: &str = "demo_users.json";

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Accepts `8080` as well as `"8080"`.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid port: {:?}", text))),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Which storage backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatabaseType {
    #[default]
    InMemory,
    Persistent,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::InMemory => "inmemory",
            DatabaseType::Persistent => "persistent",
        }
    }
}

// Anything other than "persistent" selects the in-memory backend.
impl From<String> for DatabaseType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "persistent" => DatabaseType::Persistent,
            _ => DatabaseType::InMemory,
        }
    }
}

impl From<DatabaseType> for String {
    fn from(value: DatabaseType) -> Self {
        value.as_str().to_string()
    }
}

/// Storage backend tuning. Read-only once the backend is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub max_connections: u32,
    pub timeout_seconds: u64,
    /// Maximum number of cached records per backend instance
    pub cache_size: usize,
    /// Record file for the persistent backend; defaults to the temp dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::InMemory,
            max_connections: 10,
            timeout_seconds: 30,
            cache_size: 100,
            data_file: None,
        }
    }
}

impl DatabaseConfig {
    /// Resolves the on-disk path used by the persistent backend.
    pub fn data_file_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_DATA_FILE))
    }
}

/// Application-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
    pub features: FeatureFlags,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            features: FeatureFlags::default(),
        }
    }
}

/// Boolean switches gating caching, metrics, and rate limiting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeatureFlags {
    pub cache_enabled: bool,
    pub metrics_enabled: bool,
    pub rate_limiting: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            metrics_enabled: false,
            rate_limiting: false,
        }
    }
}

impl Config {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is an error.
    /// Environment overrides are applied afterwards in both cases.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Loads from `CONFIG_PATH`, or `config.json` when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Applies `HOST`, `PORT` and `DATABASE_TYPE` overrides from `lookup`.
    ///
    /// Unparseable ports are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|v| !v.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(db_type) = lookup("DATABASE_TYPE").filter(|v| !v.is_empty()) {
            self.database.db_type = DatabaseType::from(db_type);
        }
    }

    /// `host:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
