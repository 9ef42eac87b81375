//! Process configuration.
//!
//! Settings are read once at start-up from `config/config.toml` (optional)
//! and then from `APP__*` environment variables, e.g.
//! `APP__BACKEND__URL=https://xyz.example.co` or `APP__SERVER__PORT=9000`.
//! When no managed backend URL is configured the server falls back to the
//! local object store and the static auth provider, which is how development
//! and tests run.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Managed backend-as-a-service endpoint and keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default)]
    pub service_key: String,
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_import_bucket")]
    pub import_bucket: String,
    /// Root directory of the filesystem store used without a managed backend.
    #[serde(default = "default_local_root")]
    pub local_root: String,
}

/// Account accepted by the built-in auth provider (no managed backend).
#[derive(Debug, Clone, Deserialize)]
pub struct DevAccount {
    pub email: String,
    pub password: String,
    #[serde(default = "default_full_name")]
    pub full_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub dev_accounts: Vec<DevAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "backoffice.sqlite".to_string()
}

fn default_import_bucket() -> String {
    "imports".to_string()
}

fn default_local_root() -> String {
    "./storage".to_string()
}

fn default_full_name() -> String {
    "Administrator".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            import_bucket: default_import_bucket(),
            local_root: default_local_root(),
        }
    }
}

impl AppConfig {
    /// Load from `config/config.toml` (if present) overlaid with `APP__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize::<AppConfig>().map_err(|e| {
            ConfigError::Message(format!("configuration could not be loaded: {}", e))
        })
    }
}
