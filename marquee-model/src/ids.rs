use std::{fmt, str::FromStr};

use uuid::Uuid;

use crate::error::ModelError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        pub struct $name(pub Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|err| {
                    ModelError::invalid($label, err.to_string())
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Strongly typed ID for movies
    MovieID,
    "movie id"
);
uuid_id!(
    /// Strongly typed ID for a single user rating
    RatingID,
    "rating id"
);
uuid_id!(UserID, "user id");
uuid_id!(CinemaID, "cinema id");
uuid_id!(ShowtimeID, "showtime id");
uuid_id!(ActorID, "actor id");
uuid_id!(GenreID, "genre id");
uuid_id!(FavoriteID, "favorite id");
uuid_id!(
    /// Streaming platform (online cinema) identifier
    OnlineCinemaID,
    "online cinema id"
);
uuid_id!(
    /// Identifier of a movie ↔ streaming platform link
    StreamingLinkID,
    "streaming link id"
);
uuid_id!(VisitID, "visit id");
