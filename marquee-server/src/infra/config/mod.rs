//! Runtime configuration: environment variables layered over an optional
//! TOML/JSON file, with built-in defaults for everything but the database.

pub mod loader;
pub mod sources;

use std::{path::PathBuf, time::Duration};

use marquee_core::{domain::StatusPolicy, infra::cache::CacheTtls};
use url::Url;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@marquee.local";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub cors: CorsConfig,
    pub status_policy: StatusPolicy,
    pub notifications: NotificationConfig,
    pub cache: CacheTtls,
    pub tasks: TaskConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub webhook_url: Option<Url>,
    pub from_address: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub enabled: bool,
    pub status_sweep_interval: Duration,
    pub rating_sweep_interval: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            status_sweep_interval: DEFAULT_SWEEP_INTERVAL,
            rating_sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    #[default]
    Defaults,
    File(PathBuf),
    InlineJson,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub source: ConfigSource,
    pub env_file_loaded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            redis: None,
            cors: CorsConfig::default(),
            status_policy: StatusPolicy::default(),
            notifications: NotificationConfig::default(),
            cache: CacheTtls::default(),
            tasks: TaskConfig::default(),
            dev_mode: false,
            metadata: ConfigMetadata::default(),
        }
    }
}

impl Config {
    /// Loads `.env`, the environment and any config file.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        ConfigLoader::new().load().map(|load| load.config)
    }

    /// In-process defaults for tests and throwaway dev runs.
    pub fn dev() -> Self {
        Self {
            dev_mode: true,
            tasks: TaskConfig {
                enabled: false,
                ..TaskConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
