//! Whole-catalog recomputation passes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::scheduler::PeriodicTask;
use crate::{
    application::{
        movies::MovieService, ratings::RatingService,
        unit_of_work::AppUnitOfWork,
    },
    error::Result,
};

/// Outcome of a sweep over a set of movies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: u64,
    pub changed: u64,
    pub failed: u64,
}

/// Re-resolves every movie's status against today's date.
#[derive(Debug, Clone)]
pub struct StatusSweep {
    movies: MovieService,
}

impl StatusSweep {
    pub fn new(movies: MovieService) -> Self {
        Self { movies }
    }

    pub async fn run_for(&self, today: NaiveDate) -> Result<SweepReport> {
        let report = self.movies.refresh_statuses(&[], today).await?;
        info!(
            examined = report.examined,
            changed = report.changed,
            failed = report.failed,
            "status sweep finished"
        );
        Ok(report)
    }
}

#[async_trait]
impl PeriodicTask for StatusSweep {
    fn name(&self) -> &'static str {
        "status-sweep"
    }

    async fn run_once(&self) -> Result<SweepReport> {
        self.run_for(Utc::now().date_naive()).await
    }
}

/// Recomputes every movie's rating aggregate from its stored ratings.
#[derive(Debug, Clone)]
pub struct RatingSweep {
    uow: Arc<AppUnitOfWork>,
    ratings: RatingService,
}

impl RatingSweep {
    pub fn new(uow: Arc<AppUnitOfWork>) -> Self {
        let ratings = RatingService::new(uow.clone());
        Self { uow, ratings }
    }
}

#[async_trait]
impl PeriodicTask for RatingSweep {
    fn name(&self) -> &'static str {
        "rating-sweep"
    }

    async fn run_once(&self) -> Result<SweepReport> {
        let ids = self.uow.movies.list_ids().await?;
        let mut report = SweepReport::default();

        for id in ids {
            report.examined += 1;
            let before = match self.uow.movies.get(id).await {
                Ok(movie) => movie.map(|m| m.rating_stats()),
                Err(err) => {
                    warn!(movie_id = %id, error = %err, "failed to read stored rating stats");
                    report.failed += 1;
                    continue;
                }
            };
            match self.ratings.recompute(id).await {
                Ok(stats) if Some(stats) != before => report.changed += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(movie_id = %id, error = %err, "rating recompute failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            changed = report.changed,
            failed = report.failed,
            "rating sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use marquee_model::{Movie, MovieID, MovieStatus, RatingStats, RatingValue, User, UserID};

    use super::*;
    use crate::{
        database::ports::movies::MockMoviesRepository,
        domain::StatusPolicy,
        error::CatalogError,
        tasks::notifications::Notifier,
    };

    fn movie(release: NaiveDate, status: MovieStatus) -> Movie {
        Movie {
            id: MovieID::new(),
            title: "Sicario".into(),
            description: String::new(),
            release_date: release,
            duration: 121,
            poster: None,
            trailer_url: None,
            genres: Vec::new(),
            cast: Vec::new(),
            average_rating: 0.0,
            total_ratings: 0,
            status,
            created_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn status_sweep_only_counts_changed_movies() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let stale = movie(today - Duration::days(120), MovieStatus::InTheaters);
        let fresh = movie(today - Duration::days(5), MovieStatus::InTheaters);
        uow.movies.insert(&stale).await.unwrap();
        uow.movies.insert(&fresh).await.unwrap();

        let service = MovieService::new(uow.clone(), StatusPolicy::default(), Notifier::log_only("x@test"));
        let report = StatusSweep::new(service).run_for(today).await.unwrap();

        assert_eq!(report, SweepReport { examined: 2, changed: 1, failed: 0 });
        let stored = uow.movies.get(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MovieStatus::Ended);
    }

    #[tokio::test]
    async fn rating_sweep_repairs_drifted_aggregates() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let m = movie(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), MovieStatus::Ended);
        uow.movies.insert(&m).await.unwrap();
        let user = User { id: UserID::new(), username: "kate".into(), email: None, created_at: Utc::now() };
        uow.users.insert(&user).await.unwrap();
        uow.ratings
            .upsert(m.id, user.id, RatingValue::new(8).unwrap(), Utc::now())
            .await
            .unwrap();
        uow.movies
            .update_rating_stats(m.id, RatingStats { average: 1.0, count: 40 })
            .await
            .unwrap();

        let sweep = RatingSweep::new(uow.clone());
        let first = sweep.run_once().await.unwrap();
        let second = sweep.run_once().await.unwrap();

        assert_eq!(first.changed, 1);
        assert_eq!(second.changed, 0);
        let stored = uow.movies.get(m.id).await.unwrap().unwrap();
        assert_eq!(stored.rating_stats(), RatingStats { average: 8.0, count: 1 });
    }

    #[tokio::test]
    async fn rating_sweep_counts_unreadable_movies_as_failed() {
        let id = MovieID::new();
        let mut movies = MockMoviesRepository::new();
        movies.expect_list_ids().returning(move || Ok(vec![id]));
        movies
            .expect_get()
            .returning(|_| Err(CatalogError::Database("connection reset".into())));
        movies.expect_update_rating_stats().never();

        let mut uow = AppUnitOfWork::in_memory();
        uow.movies = Arc::new(movies);

        let report = RatingSweep::new(Arc::new(uow)).run_once().await.unwrap();
        assert_eq!(report, SweepReport { examined: 1, changed: 0, failed: 1 });
    }
}
