use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

use marquee_core::{domain::StatusPolicy, infra::cache::CacheTtls};

use super::{
    Config, ConfigMetadata, ConfigSource, CorsConfig, DatabaseConfig,
    NotificationConfig, RedisConfig, ServerConfig, TaskConfig,
    DEFAULT_FROM_ADDRESS, DEFAULT_SWEEP_INTERVAL,
    sources::{EnvConfig, FileCacheConfig, FileConfig, FileTaskConfig},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["marquee.toml", "config/marquee.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// Effective configuration plus any non-fatal findings.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: Vec<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env = EnvConfig::gather();
        let (file, source) = self.load_file_config(&env)?;
        let metadata = ConfigMetadata {
            source,
            env_file_loaded,
        };

        compose_config(file.unwrap_or_default(), env, metadata)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, ConfigSource), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            let file = read_file_config(&path)?;
            return Ok((Some(file), ConfigSource::File(path)));
        }

        if let Some(raw) = &env.config_json {
            let file = serde_json::from_str(raw)
                .map_err(|source| ConfigLoadError::InlineJson { source })?;
            return Ok((Some(file), ConfigSource::InlineJson));
        }

        let found = DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists());
        match found {
            Some(path) => {
                let file = read_file_config(&path)?;
                Ok((Some(file), ConfigSource::File(path)))
            }
            None => Ok((None, ConfigSource::Defaults)),
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&contents).map_err(|source| {
            ConfigLoadError::ParseJson {
                path: path.to_path_buf(),
                source,
            }
        })
    } else {
        toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Environment wins over file values, which win over defaults.
pub(crate) fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<ConfigLoad, ConfigLoadError> {
    let mut warnings = Vec::new();
    let defaults = ServerConfig::default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file.server.host)
            .unwrap_or(defaults.host),
        port: env.server_port.or(file.server.port).unwrap_or(defaults.port),
    };

    let database_url = env.database_url.or(file.database.url);
    if let Some(url) = &database_url
        && !(url.starts_with("postgres://") || url.starts_with("postgresql://"))
    {
        return Err(ConfigLoadError::InvalidDatabaseUrl);
    }

    let redis = env
        .redis_url
        .map(|url| RedisConfig { url })
        .or_else(|| file.redis.map(|r| RedisConfig { url: r.url }));

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file.cors.allowed_origins)
            .unwrap_or_default(),
    };

    let status_policy = StatusPolicy::new(
        env.ended_after_days
            .or(file.catalog.ended_after_days)
            .unwrap_or(StatusPolicy::DEFAULT_ENDED_AFTER_DAYS),
    );

    let webhook_url = env
        .notify_webhook_url
        .or(file.notifications.webhook_url)
        .map(|raw| {
            Url::parse(&raw)
                .map_err(|source| ConfigLoadError::InvalidWebhookUrl { source })
        })
        .transpose()?;
    let notifications = NotificationConfig {
        webhook_url,
        from_address: env
            .notify_from_address
            .or(file.notifications.from_address)
            .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
    };

    let cache = cache_ttls(&file.cache)?;
    let tasks = task_config(&file.tasks)?;
    let dev_mode = env.dev_mode.or(file.dev_mode).unwrap_or(false);

    if database_url.is_none() {
        if dev_mode {
            warnings.push(
                "DATABASE_URL not set; serving from an in-memory store".to_string(),
            );
        } else {
            return Err(ConfigLoadError::MissingDatabaseUrl);
        }
    }
    if redis.is_none() {
        warnings.push(
            "REDIS_URL not set; listing cache is process-local".to_string(),
        );
    }

    let config = Config {
        server,
        database: DatabaseConfig { url: database_url },
        redis,
        cors,
        status_policy,
        notifications,
        cache,
        tasks,
        dev_mode,
        metadata,
    };

    Ok(ConfigLoad { config, warnings })
}

fn parse_duration(
    field: &'static str,
    raw: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        None => Ok(default),
        Some(raw) => humantime::parse_duration(raw.trim()).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field,
                value: raw.to_string(),
                source,
            }
        }),
    }
}

fn cache_ttls(file: &FileCacheConfig) -> Result<CacheTtls, ConfigLoadError> {
    let d = CacheTtls::default();
    Ok(CacheTtls {
        movies: parse_duration("cache.movies", file.movies.as_deref(), d.movies)?,
        movie_filter: parse_duration(
            "cache.movie_filter",
            file.movie_filter.as_deref(),
            d.movie_filter,
        )?,
        trending: parse_duration(
            "cache.trending",
            file.trending.as_deref(),
            d.trending,
        )?,
        showtimes: parse_duration(
            "cache.showtimes",
            file.showtimes.as_deref(),
            d.showtimes,
        )?,
        cinemas: parse_duration(
            "cache.cinemas",
            file.cinemas.as_deref(),
            d.cinemas,
        )?,
        actors: parse_duration("cache.actors", file.actors.as_deref(), d.actors)?,
        genres: parse_duration("cache.genres", file.genres.as_deref(), d.genres)?,
        online_cinemas: parse_duration(
            "cache.online_cinemas",
            file.online_cinemas.as_deref(),
            d.online_cinemas,
        )?,
    })
}

fn task_config(file: &FileTaskConfig) -> Result<TaskConfig, ConfigLoadError> {
    let config = TaskConfig {
        enabled: file.enabled.unwrap_or(true),
        status_sweep_interval: parse_duration(
            "tasks.status_sweep_interval",
            file.status_sweep_interval.as_deref(),
            DEFAULT_SWEEP_INTERVAL,
        )?,
        rating_sweep_interval: parse_duration(
            "tasks.rating_sweep_interval",
            file.rating_sweep_interval.as_deref(),
            DEFAULT_SWEEP_INTERVAL,
        )?,
    };
    if config.status_sweep_interval.is_zero()
        || config.rating_sweep_interval.is_zero()
    {
        return Err(ConfigLoadError::ZeroInterval);
    }
    Ok(config)
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse configuration {path}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse MARQUEE_CONFIG_JSON")]
    InlineJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load .env file")]
    EnvFile(#[from] dotenvy::Error),
    #[error("DATABASE_URL is required unless DEV_MODE is enabled")]
    MissingDatabaseUrl,
    #[error("database URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,
    #[error("invalid notification webhook URL")]
    InvalidWebhookUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("invalid duration for {field}: '{value}'")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("task intervals must be greater than zero")]
    ZeroInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_env() -> EnvConfig {
        EnvConfig {
            dev_mode: Some(true),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let load =
            compose_config(FileConfig::default(), dev_env(), ConfigMetadata::default())
                .unwrap();
        let config = load.config;
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.status_policy.ended_after_days, 90);
        assert_eq!(config.cache, CacheTtls::default());
        assert_eq!(config.tasks.status_sweep_interval, Duration::from_secs(60));
        assert!(config.database.url.is_none());
        assert_eq!(load.warnings.len(), 2);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut file = FileConfig::default();
        file.server.port = Some(8080);
        file.catalog.ended_after_days = Some(30);
        let env = EnvConfig {
            server_port: Some(9090),
            ..dev_env()
        };
        let config = compose_config(file, env, ConfigMetadata::default())
            .unwrap()
            .config;
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.status_policy.ended_after_days, 30);
    }

    #[test]
    fn humantime_ttls_are_parsed() {
        let mut file = FileConfig::default();
        file.cache.trending = Some("5m".into());
        file.tasks.rating_sweep_interval = Some("2h 30m".into());
        let config =
            compose_config(file, dev_env(), ConfigMetadata::default())
                .unwrap()
                .config;
        assert_eq!(config.cache.trending, Duration::from_secs(300));
        assert_eq!(config.cache.movies, Duration::from_secs(900));
        assert_eq!(
            config.tasks.rating_sweep_interval,
            Duration::from_secs(9000)
        );
    }

    #[test]
    fn malformed_duration_names_the_field() {
        let mut file = FileConfig::default();
        file.cache.genres = Some("soon".into());
        let err = compose_config(file, dev_env(), ConfigMetadata::default())
            .unwrap_err();
        assert!(err.to_string().contains("cache.genres"));
    }

    #[test]
    fn database_is_required_outside_dev_mode() {
        let err = compose_config(
            FileConfig::default(),
            EnvConfig::default(),
            ConfigMetadata::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingDatabaseUrl));
    }

    #[test]
    fn non_postgres_urls_are_rejected() {
        let env = EnvConfig {
            database_url: Some("mysql://localhost/marquee".into()),
            ..EnvConfig::default()
        };
        let err =
            compose_config(FileConfig::default(), env, ConfigMetadata::default())
                .unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidDatabaseUrl));
    }
}
