use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "marquee:v1";

/// Query parameters in canonical order: keys sorted, repeated values sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let values = self.params.entry(key.into()).or_default();
        values.push(value.into());
        values.sort();
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Form-encoded rendering of the canonical parameter set.
    pub fn canonical(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// `marquee:v1:<operation>:<sha256 of canonical params>`
    pub fn listing(operation: &str, params: &QueryParams) -> String {
        let digest = Sha256::digest(params.canonical().as_bytes());
        format!("{KEY_PREFIX}:{operation}:{}", hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independently_built_params_share_a_key() {
        let a = QueryParams::from_pairs([("status", "now"), ("page", "2")]);
        let b = QueryParams::new().with("page", "2").with("status", "now");
        assert_eq!(
            CacheKeys::listing("movie_filter", &a),
            CacheKeys::listing("movie_filter", &b)
        );
    }

    #[test]
    fn different_values_produce_different_keys() {
        let now = QueryParams::from_pairs([("status", "now")]);
        let soon = QueryParams::from_pairs([("status", "soon")]);
        assert_ne!(
            CacheKeys::listing("movie_filter", &now),
            CacheKeys::listing("movie_filter", &soon)
        );
    }

    #[test]
    fn operation_is_part_of_the_key() {
        let params = QueryParams::new();
        assert_ne!(
            CacheKeys::listing("movies", &params),
            CacheKeys::listing("cinemas", &params)
        );
    }

    #[test]
    fn repeated_values_are_order_insensitive() {
        let a = QueryParams::from_pairs([("genre", "b"), ("genre", "a")]);
        let b = QueryParams::from_pairs([("genre", "a"), ("genre", "b")]);
        assert_eq!(a.canonical(), "genre=a&genre=b");
        assert_eq!(a, b);
    }

    #[test]
    fn key_has_expected_shape() {
        let key = CacheKeys::listing("genres", &QueryParams::new());
        let digest = key.strip_prefix("marquee:v1:genres:").unwrap();
        assert_eq!(digest.len(), 64);
    }
}
