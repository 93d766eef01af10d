//! Reference records around a movie: where and when it plays, who is in it,
//! how it is classified and where it streams.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::ModelError,
    ids::{
        ActorID, CinemaID, GenreID, MovieID, OnlineCinemaID, ShowtimeID,
        StreamingLinkID,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cinema {
    pub id: CinemaID,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Showtime {
    pub id: ShowtimeID,
    pub movie_id: MovieID,
    pub cinema_id: CinemaID,
    pub start_time: DateTime<Utc>,
    pub ticket_price: Decimal,
}

impl Showtime {
    /// Prices are stored with two fractional digits and may not be negative.
    pub fn normalize_price(price: Decimal) -> Result<Decimal, ModelError> {
        if price.is_sign_negative() {
            return Err(ModelError::invalid(
                "ticket_price",
                "must not be negative",
            ));
        }
        let rounded = price.round_dp(2);
        if rounded >= Decimal::new(10_000, 0) {
            return Err(ModelError::invalid(
                "ticket_price",
                "must be below 10000.00",
            ));
        }
        Ok(rounded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    pub id: ActorID,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub biography: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Genre {
    pub id: GenreID,
    pub name: String,
}

/// Streaming platform a movie may be watched on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OnlineCinema {
    pub id: OnlineCinemaID,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieOnlineCinema {
    pub id: StreamingLinkID,
    pub movie_id: MovieID,
    pub online_cinema_id: OnlineCinemaID,
}

/// Shared guard for the short free-text names used across reference records.
pub fn require_name(
    field: &'static str,
    value: &str,
) -> Result<String, ModelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::invalid(field, "must not be empty"));
    }
    if trimmed.chars().count() > 255 {
        return Err(ModelError::invalid(field, "must not exceed 255 characters"));
    }
    Ok(trimmed.to_string())
}
