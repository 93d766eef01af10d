use std::{fmt, sync::Arc};

use anyhow::Context;
use tracing::{info, warn};

use marquee_core::{
    application::{AppUnitOfWork, CatalogService, MovieService, RatingService},
    database::infrastructure::postgres::PostgresDatabase,
    infra::cache::{ListingCache, RedisCache},
    tasks::{Notifier, RetryPolicy, WebhookMailer},
};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub unit_of_work: Arc<AppUnitOfWork>,
    pub movies: MovieService,
    pub ratings: RatingService,
    pub catalog: CatalogService,
    pub cache: ListingCache,
    pub config: Arc<Config>,
    /// Absent when serving from the in-memory store.
    pub postgres: Option<Arc<PostgresDatabase>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        unit_of_work: Arc<AppUnitOfWork>,
        cache: ListingCache,
        notifier: Notifier,
        postgres: Option<Arc<PostgresDatabase>>,
    ) -> Self {
        let movies = MovieService::new(
            unit_of_work.clone(),
            config.status_policy,
            notifier,
        );
        Self {
            ratings: RatingService::new(unit_of_work.clone()),
            catalog: CatalogService::new(unit_of_work.clone()),
            movies,
            unit_of_work,
            cache,
            config,
            postgres,
        }
    }

    /// Fully in-process state: memory store, memory cache, log transport.
    pub fn in_memory(config: Config) -> Self {
        let cache = ListingCache::in_memory(config.cache);
        let notifier = Notifier::log_only(config.notifications.from_address.clone());
        Self::new(
            Arc::new(config),
            Arc::new(AppUnitOfWork::in_memory()),
            cache,
            notifier,
            None,
        )
    }

    /// Wires storage, cache and notification transport from configuration.
    pub async fn connect(config: Arc<Config>) -> anyhow::Result<Self> {
        let (unit_of_work, postgres) = match config.database.url.as_deref() {
            Some(url) => {
                let pg = PostgresDatabase::connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                info!("Successfully connected to PostgreSQL");
                let uow = AppUnitOfWork::postgres(pg.pool().clone());
                (Arc::new(uow), Some(Arc::new(pg)))
            }
            None => {
                warn!("No database configured; using the in-memory store");
                (Arc::new(AppUnitOfWork::in_memory()), None)
            }
        };

        let cache = match &config.redis {
            Some(redis) => match RedisCache::new(&redis.url).await {
                Ok(backend) => ListingCache::new(Arc::new(backend), config.cache),
                Err(err) => {
                    warn!(error = %err, "Redis unavailable; using the in-process cache");
                    ListingCache::in_memory(config.cache)
                }
            },
            None => ListingCache::in_memory(config.cache),
        };

        let from = config.notifications.from_address.clone();
        let notifier = match &config.notifications.webhook_url {
            Some(url) => {
                let mailer = WebhookMailer::new(url.clone(), from)
                    .context("failed to build notification webhook client")?;
                info!(endpoint = %url, "Notifications relayed via webhook");
                Notifier::new(Arc::new(mailer), RetryPolicy::default())
            }
            None => Notifier::log_only(from),
        };

        Ok(Self::new(config, unit_of_work, cache, notifier, postgres))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
