use std::{fmt, str::FromStr};

use crate::error::ModelError;

/// Display lifecycle of a movie, derived from its release date.
///
/// The value stored on a [`Movie`](crate::Movie) is a cache of the resolver in
/// `marquee-core`; it is never accepted from API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum MovieStatus {
    /// Release date is still ahead of us.
    #[cfg_attr(feature = "serde", serde(alias = "soon"))]
    #[default]
    Upcoming,
    /// Released and still inside the theatrical window.
    #[cfg_attr(feature = "serde", serde(alias = "now"))]
    InTheaters,
    /// Released longer ago than the theatrical window.
    Ended,
}

impl MovieStatus {
    pub const ALL: [MovieStatus; 3] = [
        MovieStatus::Upcoming,
        MovieStatus::InTheaters,
        MovieStatus::Ended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovieStatus::Upcoming => "upcoming",
            MovieStatus::InTheaters => "in_theaters",
            MovieStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for MovieStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieStatus {
    type Err = ModelError;

    /// Accepts the canonical names plus the legacy `soon` / `now` aliases
    /// still used by older clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" | "soon" => Ok(MovieStatus::Upcoming),
            "in_theaters" | "now" => Ok(MovieStatus::InTheaters),
            "ended" => Ok(MovieStatus::Ended),
            other => Err(ModelError::UnknownVariant {
                kind: "movie status",
                value: other.to_string(),
            }),
        }
    }
}
