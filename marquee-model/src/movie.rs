use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::ModelError,
    ids::{ActorID, GenreID, MovieID},
    rating::RatingStats,
    status::MovieStatus,
};

/// Validated movie title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MovieTitle(String);

impl MovieTitle {
    pub const MIN_CHARS: usize = 3;
    pub const MAX_CHARS: usize = 255;

    pub fn new(title: impl Into<String>) -> Result<Self, ModelError> {
        let title = title.into().trim().to_string();
        let chars = title.chars().count();
        if chars < Self::MIN_CHARS {
            return Err(ModelError::invalid(
                "title",
                format!("must contain at least {} characters", Self::MIN_CHARS),
            ));
        }
        if chars > Self::MAX_CHARS {
            return Err(ModelError::invalid(
                "title",
                format!("must not exceed {} characters", Self::MAX_CHARS),
            ));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Actor credited on a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastMember {
    pub actor_id: ActorID,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_main_role: bool,
}

/// Writable portion of a movie. Derived fields (status, rating stats) are not
/// representable here.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieDraft {
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub poster: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub trailer_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub genres: Vec<GenreID>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cast: Vec<CastMember>,
}

impl MovieDraft {
    /// Checks field constraints and returns the normalized title.
    pub fn validate(&self) -> Result<MovieTitle, ModelError> {
        let title = MovieTitle::new(self.title.clone())?;
        if self.duration == 0 {
            return Err(ModelError::invalid("duration", "must be positive"));
        }
        if self.duration > Movie::MAX_DURATION {
            return Err(ModelError::invalid(
                "duration",
                format!("must be at most {} minutes", Movie::MAX_DURATION),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for member in &self.cast {
            if !seen.insert(member.actor_id) {
                return Err(ModelError::invalid(
                    "cast",
                    format!("actor {} listed more than once", member.actor_id),
                ));
            }
        }
        Ok(title)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movie {
    pub id: MovieID,
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Runtime in minutes.
    pub duration: u32,
    pub poster: Option<String>,
    pub trailer_url: Option<String>,
    pub genres: Vec<GenreID>,
    pub cast: Vec<CastMember>,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub status: MovieStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Movie {
    /// Upper bound on `duration`; the column is a signed 32-bit integer.
    pub const MAX_DURATION: u32 = i32::MAX as u32;

    /// Builds a fresh record from a validated draft. Rating stats start empty
    /// and the caller supplies the resolved status.
    pub fn from_draft(
        id: MovieID,
        title: MovieTitle,
        draft: MovieDraft,
        status: MovieStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let mut genres = draft.genres;
        genres.sort();
        genres.dedup();
        Self {
            id,
            title: title.into_inner(),
            description: draft.description,
            release_date: draft.release_date,
            duration: draft.duration,
            poster: draft.poster,
            trailer_url: draft.trailer_url,
            genres,
            cast: draft.cast,
            average_rating: 0.0,
            total_ratings: 0,
            status,
            created_at: now,
            last_updated: now,
        }
    }

    /// Overwrites the writable fields, leaving derived fields untouched.
    pub fn apply_draft(
        &mut self,
        title: MovieTitle,
        draft: MovieDraft,
        now: DateTime<Utc>,
    ) {
        let mut genres = draft.genres;
        genres.sort();
        genres.dedup();
        self.title = title.into_inner();
        self.description = draft.description;
        self.release_date = draft.release_date;
        self.duration = draft.duration;
        self.poster = draft.poster;
        self.trailer_url = draft.trailer_url;
        self.genres = genres;
        self.cast = draft.cast;
        self.last_updated = now;
    }

    pub fn rating_stats(&self) -> RatingStats {
        RatingStats {
            average: self.average_rating,
            count: self.total_ratings,
        }
    }

    pub fn main_cast(&self) -> impl Iterator<Item = &CastMember> {
        self.cast.iter().filter(|member| member.is_main_role)
    }
}
