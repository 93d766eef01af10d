use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::{StreamExt, stream};
use marquee_model::{ActorID, Movie, MovieDraft, MovieID, MovieTitle};
use tracing::{info, warn};

use crate::{
    application::unit_of_work::AppUnitOfWork,
    domain::lifecycle::StatusPolicy,
    error::{CatalogError, Result},
    tasks::{
        notifications::{Notification, Notifier},
        sweeps::SweepReport,
    },
};

const REFRESH_CONCURRENCY: usize = 8;

/// Movie writes with eager status resolution.
#[derive(Debug, Clone)]
pub struct MovieService {
    uow: Arc<AppUnitOfWork>,
    policy: StatusPolicy,
    notifier: Notifier,
}

impl MovieService {
    pub fn new(
        uow: Arc<AppUnitOfWork>,
        policy: StatusPolicy,
        notifier: Notifier,
    ) -> Self {
        Self {
            uow,
            policy,
            notifier,
        }
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    async fn validate(&self, draft: &MovieDraft) -> Result<MovieTitle> {
        let title = draft.validate()?;

        if !self.uow.genres.exists_all(&draft.genres).await? {
            return Err(CatalogError::Validation(
                "genres: one or more genres do not exist".into(),
            ));
        }

        let actor_ids: Vec<ActorID> =
            draft.cast.iter().map(|member| member.actor_id).collect();
        let found = self.uow.actors.get_many(&actor_ids).await?;
        if found.len() != actor_ids.len() {
            return Err(CatalogError::Validation(
                "cast: one or more actors do not exist".into(),
            ));
        }

        Ok(title)
    }

    /// Stores a new movie and notifies every user with an email address.
    pub async fn create(&self, draft: MovieDraft, today: NaiveDate) -> Result<Movie> {
        let title = self.validate(&draft).await?;
        let status = self.policy.resolve(draft.release_date, today);
        let movie = Movie::from_draft(MovieID::new(), title, draft, status, Utc::now());

        self.uow.movies.insert(&movie).await?;
        info!(movie_id = %movie.id, title = %movie.title, status = %movie.status, "movie created");

        self.notify_new_movie(&movie).await;
        Ok(movie)
    }

    async fn notify_new_movie(&self, movie: &Movie) {
        let recipients = match self.uow.users.list_notifiable().await {
            Ok(users) => users,
            Err(err) => {
                warn!(movie_id = %movie.id, error = %err, "could not load notification recipients");
                return;
            }
        };
        for user in recipients {
            if let Some(email) = user.email {
                self.notifier
                    .dispatch(Notification::new_movie(email, &movie.title));
            }
        }
    }

    /// Replaces the writable fields and re-derives the status.
    pub async fn update(
        &self,
        id: MovieID,
        draft: MovieDraft,
        today: NaiveDate,
    ) -> Result<Movie> {
        let mut movie = self.get(id).await?;
        let title = self.validate(&draft).await?;
        movie.apply_draft(title, draft, Utc::now());
        self.policy.refresh(&mut movie, today);
        self.uow.movies.update(&movie).await?;
        Ok(movie)
    }

    pub async fn delete(&self, id: MovieID) -> Result<()> {
        self.uow.movies.delete(id).await?;
        info!(movie_id = %id, "movie deleted");
        Ok(())
    }

    pub async fn get(&self, id: MovieID) -> Result<Movie> {
        self.uow
            .movies
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("movie", id))
    }

    /// Re-resolves one movie's status, persisting only a changed value.
    pub async fn refresh_status(&self, id: MovieID, today: NaiveDate) -> Result<bool> {
        let mut movie = self.get(id).await?;
        if !self.policy.refresh(&mut movie, today) {
            return Ok(false);
        }
        self.uow.movies.update_status(id, movie.status).await?;
        Ok(true)
    }

    /// Refreshes the given movies, or every movie when `ids` is empty. One
    /// failing movie does not stop the rest.
    pub async fn refresh_statuses(
        &self,
        ids: &[MovieID],
        today: NaiveDate,
    ) -> Result<SweepReport> {
        let ids = if ids.is_empty() {
            self.uow.movies.list_ids().await?
        } else {
            ids.to_vec()
        };

        let mut outcomes = stream::iter(ids)
            .map(|id| async move { (id, self.refresh_status(id, today).await) })
            .buffer_unordered(REFRESH_CONCURRENCY);

        let mut report = SweepReport::default();
        while let Some((id, outcome)) = outcomes.next().await {
            report.examined += 1;
            match outcome {
                Ok(true) => report.changed += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(movie_id = %id, error = %err, "status refresh failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use marquee_model::{Genre, GenreID, MovieStatus, User, UserID};

    use super::*;
    use crate::tasks::notifications::{MockNotificationDispatcher, RetryPolicy};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn draft(title: &str, release: NaiveDate) -> MovieDraft {
        MovieDraft {
            title: title.into(),
            description: String::new(),
            release_date: release,
            duration: 120,
            poster: None,
            trailer_url: None,
            genres: Vec::new(),
            cast: Vec::new(),
        }
    }

    fn service(uow: Arc<AppUnitOfWork>) -> MovieService {
        MovieService::new(uow, StatusPolicy::default(), Notifier::log_only("noreply@test"))
    }

    #[tokio::test]
    async fn create_resolves_status_eagerly() {
        let svc = service(Arc::new(AppUnitOfWork::in_memory()));
        let upcoming = svc.create(draft("Tenet", today() + Duration::days(3)), today()).await.unwrap();
        let showing = svc.create(draft("Dunkirk", today() - Duration::days(10)), today()).await.unwrap();
        let ended = svc.create(draft("Memento", today() - Duration::days(91)), today()).await.unwrap();

        assert_eq!(upcoming.status, MovieStatus::Upcoming);
        assert_eq!(showing.status, MovieStatus::InTheaters);
        assert_eq!(ended.status, MovieStatus::Ended);
    }

    #[tokio::test]
    async fn unknown_genre_is_a_validation_error() {
        let svc = service(Arc::new(AppUnitOfWork::in_memory()));
        let mut d = draft("Tenet", today());
        d.genres.push(GenreID::new());
        let err = svc.create(d, today()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn update_keeps_rating_stats_and_rederives_status() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        let genre = Genre { id: GenreID::new(), name: "Drama".into() };
        uow.genres.insert(&genre).await.unwrap();
        let svc = service(uow.clone());

        let movie = svc.create(draft("Tenet", today() + Duration::days(3)), today()).await.unwrap();
        uow.movies
            .update_rating_stats(movie.id, marquee_model::RatingStats { average: 8.0, count: 2 })
            .await
            .unwrap();

        let mut edit = draft("Tenet (IMAX)", today() - Duration::days(1));
        edit.genres.push(genre.id);
        let updated = svc.update(movie.id, edit, today()).await.unwrap();

        assert_eq!(updated.status, MovieStatus::InTheaters);
        let stored = uow.movies.get(movie.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Tenet (IMAX)");
        assert_eq!(stored.total_ratings, 2);
        assert_eq!(stored.genres, vec![genre.id]);
    }

    #[tokio::test]
    async fn refresh_reports_changes_only() {
        let svc = service(Arc::new(AppUnitOfWork::in_memory()));
        let movie = svc.create(draft("Tenet", today() - Duration::days(80)), today()).await.unwrap();

        assert!(!svc.refresh_status(movie.id, today()).await.unwrap());
        let later = today() + Duration::days(20);
        assert!(svc.refresh_status(movie.id, later).await.unwrap());
        assert_eq!(svc.get(movie.id).await.unwrap().status, MovieStatus::Ended);
    }

    #[tokio::test]
    async fn creating_a_movie_notifies_users_with_email() {
        let uow = Arc::new(AppUnitOfWork::in_memory());
        for (name, email) in [("ann", Some("ann@example.com")), ("bob", None)] {
            uow.users
                .insert(&User {
                    id: UserID::new(),
                    username: name.into(),
                    email: email.map(String::from),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher.expect_send().times(1).returning(move |n| {
            let _ = tx.send(n.clone());
            Ok(())
        });
        let notifier = Notifier::new(Arc::new(dispatcher), RetryPolicy::default());
        let svc = MovieService::new(uow, StatusPolicy::default(), notifier);

        svc.create(draft("Oppenheimer", today()), today()).await.unwrap();

        let sent = rx.recv().await.unwrap();
        assert_eq!(sent.recipient, "ann@example.com");
        assert_eq!(sent.subject, "New Movie Added: Oppenheimer");
    }
}
