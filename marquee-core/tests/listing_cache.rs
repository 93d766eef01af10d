use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use marquee_core::{
    application::{AppUnitOfWork, MovieService},
    database::ports::movies::MovieFilter,
    domain::StatusPolicy,
    infra::cache::{
        CacheTtls, CachedOperation, InMemoryCache, ListingCache, QueryParams,
    },
    query::{Page, PageRequest},
    tasks::Notifier,
};
use marquee_model::{Movie, MovieDraft};

async fn list_movies(
    cache: &ListingCache,
    uow: &Arc<AppUnitOfWork>,
    params: &QueryParams,
) -> Page<Movie> {
    let request = PageRequest::from_raw(params.get("page"), params.get("page_size"));
    cache
        .get_or_fetch(CachedOperation::Movies, params, || async {
            let filter = MovieFilter::default();
            let count = uow.movies.count(&filter).await?;
            let window = request.window(count);
            let results = uow.movies.list(&filter, window).await?;
            Ok(Page::new(window, results))
        })
        .await
        .unwrap()
}

fn draft(title: &str) -> MovieDraft {
    MovieDraft {
        title: title.into(),
        description: String::new(),
        release_date: Utc::now().date_naive() - ChronoDuration::days(3),
        duration: 95,
        poster: None,
        trailer_url: None,
        genres: Vec::new(),
        cast: Vec::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn listing_is_stale_within_ttl_and_fresh_after() {
    let uow = Arc::new(AppUnitOfWork::in_memory());
    let movies = MovieService::new(uow.clone(), StatusPolicy::default(), Notifier::log_only("x@test"));
    let ttls = CacheTtls::default();
    let cache = ListingCache::in_memory(ttls);
    let params = QueryParams::from_pairs([("page", "1")]);
    let today = Utc::now().date_naive();

    movies.create(draft("First Cow"), today).await.unwrap();
    let before = list_movies(&cache, &uow, &params).await;
    assert_eq!(before.count, 1);

    movies.create(draft("Showing Up"), today).await.unwrap();
    let stale = list_movies(&cache, &uow, &params).await;
    assert_eq!(stale, before);

    tokio::time::advance(ttls.movies + std::time::Duration::from_secs(1)).await;
    let fresh = list_movies(&cache, &uow, &params).await;
    assert_eq!(fresh.count, 2);
}

#[tokio::test(start_paused = true)]
async fn one_off_query_keys_do_not_accumulate_after_expiry() {
    let backend = Arc::new(InMemoryCache::new());
    let ttls = CacheTtls::default();
    let cache = ListingCache::new(backend.clone(), ttls);
    let uow = Arc::new(AppUnitOfWork::in_memory());

    for i in 0..1000 {
        let params = QueryParams::from_pairs([("junk", i.to_string())]);
        list_movies(&cache, &uow, &params).await;
    }
    assert_eq!(backend.len(), 1000);

    tokio::time::advance(std::time::Duration::from_secs(24 * 60 * 60)).await;
    list_movies(&cache, &uow, &QueryParams::new()).await;
    assert_eq!(backend.len(), 1);
}
