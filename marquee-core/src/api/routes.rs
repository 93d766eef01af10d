macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API route definitions for the Marquee REST surface
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod system {
        pub const PING: &str = v1_path!("/ping");
        pub const HEALTH: &str = v1_path!("/health");
    }

    pub mod movies {
        pub const COLLECTION: &str = v1_path!("/movies");
        pub const FILTER: &str = v1_path!("/movies/filter");
        pub const TRENDING: &str = v1_path!("/movies/trending");
        pub const BULK_STATUS: &str = v1_path!("/movies/bulk-status");
        pub const ITEM: &str = v1_path!("/movies/{id}");
        pub const ACTORS: &str = v1_path!("/movies/{id}/actors");
        pub const RATINGS: &str = v1_path!("/movies/{id}/ratings");
        pub const FAVORITE: &str = v1_path!("/movies/{id}/favorite");
        pub const ONLINE_CINEMAS: &str = v1_path!("/movies/{id}/online-cinemas");
    }

    pub mod ratings {
        pub const ITEM: &str = v1_path!("/ratings/{id}");
    }

    pub mod users {
        pub const COLLECTION: &str = v1_path!("/users");
        pub const FAVORITES: &str = v1_path!("/users/{id}/favorites");
    }

    pub mod cinemas {
        pub const COLLECTION: &str = v1_path!("/cinemas");
        pub const ITEM: &str = v1_path!("/cinemas/{id}");
    }

    pub mod showtimes {
        pub const COLLECTION: &str = v1_path!("/showtimes");
        pub const ITEM: &str = v1_path!("/showtimes/{id}");
    }

    pub mod actors {
        pub const COLLECTION: &str = v1_path!("/actors");
        pub const ITEM: &str = v1_path!("/actors/{id}");
    }

    pub mod genres {
        pub const COLLECTION: &str = v1_path!("/genres");
    }

    pub mod online_cinemas {
        pub const COLLECTION: &str = v1_path!("/online-cinemas");
    }

    pub mod visits {
        pub const COLLECTION: &str = v1_path!("/visits");
    }
}

/// Helpers for building concrete request paths from the route templates.
pub mod utils {
    /// Replace a single path parameter such as `{id}`.
    pub fn replace_param(
        route: &str,
        param: &str,
        value: impl AsRef<str>,
    ) -> String {
        route.replace(param, value.as_ref())
    }

    /// Append query parameters to the provided route.
    pub fn with_query(route: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return route.to_string();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{route}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_concrete_paths() {
        let path = utils::replace_param(v1::movies::RATINGS, "{id}", "abc");
        assert_eq!(path, "/api/v1/movies/abc/ratings");
        assert_eq!(
            utils::with_query(v1::movies::FILTER, &[("status", "now"), ("page", "2")]),
            "/api/v1/movies/filter?status=now&page=2"
        );
    }
}
