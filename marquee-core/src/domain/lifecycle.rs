//! Release-date driven movie status.

use chrono::{NaiveDate, Utc};
use marquee_model::{Movie, MovieStatus};

/// Theatrical window applied by every status computation, eager or batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    /// A movie released more than this many days ago is `ended`.
    pub ended_after_days: u32,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            ended_after_days: Self::DEFAULT_ENDED_AFTER_DAYS,
        }
    }
}

impl StatusPolicy {
    pub const DEFAULT_ENDED_AFTER_DAYS: u32 = 90;

    pub fn new(ended_after_days: u32) -> Self {
        Self { ended_after_days }
    }

    /// `upcoming` strictly before release, `ended` once the release is more
    /// than `ended_after_days` behind `today`, `in_theaters` in between.
    pub fn resolve(&self, release_date: NaiveDate, today: NaiveDate) -> MovieStatus {
        if release_date > today {
            return MovieStatus::Upcoming;
        }
        let days_since = (today - release_date).num_days();
        if days_since > i64::from(self.ended_after_days) {
            MovieStatus::Ended
        } else {
            MovieStatus::InTheaters
        }
    }

    /// Writes the resolved status onto `movie` only when it differs; returns
    /// whether anything changed.
    pub fn refresh(&self, movie: &mut Movie, today: NaiveDate) -> bool {
        let resolved = self.resolve(movie.release_date, today);
        if resolved == movie.status {
            return false;
        }
        movie.status = resolved;
        movie.last_updated = Utc::now();
        true
    }
}
