use chrono::{DateTime, Utc};

use crate::{
    error::ModelError,
    ids::{MovieID, RatingID, UserID},
};

/// A single user score, bounded to `MIN..=MAX`.
///
/// Constructing one is the only validation gate in front of aggregation, so an
/// aggregate can never observe an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i64", into = "i64")
)]
pub struct RatingValue(u8);

impl RatingValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, ModelError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ModelError::invalid(
                "rating",
                format!(
                    "{value} is outside the allowed range {}..={}",
                    Self::MIN,
                    Self::MAX
                ),
            ))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for i64 {
    fn from(value: RatingValue) -> Self {
        i64::from(value.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rating {
    pub id: RatingID,
    pub movie_id: MovieID,
    pub user_id: UserID,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized rating summary projected onto a movie.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingStats {
    pub average: f64,
    pub count: u32,
}

impl RatingStats {
    pub const EMPTY: RatingStats = RatingStats {
        average: 0.0,
        count: 0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inclusive_bounds() {
        assert_eq!(RatingValue::new(1).unwrap().get(), 1);
        assert_eq!(RatingValue::new(10).unwrap().get(), 10);
    }

    #[test]
    fn rejects_values_outside_range() {
        assert!(RatingValue::new(0).is_err());
        assert!(RatingValue::new(11).is_err());
        assert!(RatingValue::new(-3).is_err());
    }
}
