use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML or JSON file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub redis: Option<FileRedisConfig>,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub catalog: FileCatalogConfig,
    #[serde(default)]
    pub notifications: FileNotificationConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub tasks: FileTaskConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRedisConfig {
    pub url: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_after_days: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileNotificationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
}

/// Per-listing TTLs as humantime strings (`"15m"`, `"1h"`).
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showtimes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cinemas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_cinemas: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTaskConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_sweep_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_sweep_interval: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub dev_mode: Option<bool>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub ended_after_days: Option<u32>,
    pub notify_webhook_url: Option<String>,
    pub notify_from_address: Option<String>,
    pub config_path: Option<PathBuf>,
    pub config_json: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            server_host: non_empty_var("SERVER_HOST"),
            server_port: non_empty_var("SERVER_PORT")
                .and_then(|s| s.parse().ok()),
            database_url: non_empty_var("DATABASE_URL"),
            redis_url: non_empty_var("REDIS_URL"),
            dev_mode: non_empty_var("DEV_MODE").and_then(|s| parse_bool(&s)),
            cors_allowed_origins: parse_csv_var("CORS_ALLOWED_ORIGINS"),
            ended_after_days: non_empty_var("STATUS_ENDED_AFTER_DAYS")
                .and_then(|s| s.parse().ok()),
            notify_webhook_url: non_empty_var("NOTIFY_WEBHOOK_URL"),
            notify_from_address: non_empty_var("NOTIFY_FROM_ADDRESS"),
            config_path: non_empty_var("MARQUEE_CONFIG_PATH").map(PathBuf::from),
            config_json: non_empty_var("MARQUEE_CONFIG_JSON"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    non_empty_var(name).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
