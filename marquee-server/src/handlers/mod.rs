//! HTTP request handlers organized by resource.

pub mod actors;
pub mod cinemas;
pub mod genres;
pub mod movies;
pub mod online_cinemas;
pub mod ratings;
pub mod showtimes;
pub mod system;
pub mod users;
pub mod visits;

use std::{convert::Infallible, future::Future, str::FromStr};

use axum::{extract::FromRequestParts, http::request::Parts};
use marquee_core::{
    infra::cache::QueryParams,
    query::{Page, PageRequest, PageWindow},
};

use crate::infra::errors::{AppError, AppResult};

/// Canonical query parameters plus the page controls derived from them.
///
/// Built from the raw query string so the cache key sees every parameter the
/// client sent, not just the ones a handler understands.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub params: QueryParams,
    pub page: PageRequest,
}

impl ListQuery {
    pub fn from_query_string(raw: Option<&str>) -> Self {
        let params = raw
            .map(|query| {
                QueryParams::from_pairs(url::form_urlencoded::parse(
                    query.as_bytes(),
                ))
            })
            .unwrap_or_default();
        let page =
            PageRequest::from_raw(params.get("page"), params.get("page_size"));
        Self { params, page }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).filter(|value| !value.trim().is_empty())
    }

    /// Parses an optional typed parameter; malformed values are a 400.
    pub fn parse<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|err| {
                    AppError::bad_request(format!("{key}: {err}"))
                })
            })
            .transpose()
    }
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query_string(parts.uri.query()))
    }
}

/// Counts, clamps the requested page onto the result set, then fetches it.
pub async fn paged<T, C, L, F>(
    request: PageRequest,
    count: C,
    list: L,
) -> marquee_core::Result<Page<T>>
where
    C: Future<Output = marquee_core::Result<u64>>,
    L: FnOnce(PageWindow) -> F,
    F: Future<Output = marquee_core::Result<Vec<T>>>,
{
    let window = request.window(count.await?);
    let results = list(window).await?;
    Ok(Page::new(window, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::query::RequestedPage;
    use marquee_model::MovieStatus;

    #[test]
    fn list_query_reads_page_controls() {
        let query = ListQuery::from_query_string(Some("page=abc&page_size=500"));
        assert_eq!(query.page.page, RequestedPage::First);
        assert_eq!(query.page.page_size, 100);
    }

    #[test]
    fn typed_parameters_reject_garbage() {
        let query = ListQuery::from_query_string(Some("status=now&genre=x"));
        assert_eq!(
            query.parse::<MovieStatus>("status").unwrap(),
            Some(MovieStatus::InTheaters)
        );
        assert!(query.parse::<MovieStatus>("missing").unwrap().is_none());
        let err = query
            .parse::<marquee_model::GenreID>("genre")
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
