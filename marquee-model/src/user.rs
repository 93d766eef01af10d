use chrono::{DateTime, Utc};

use crate::ids::{FavoriteID, MovieID, UserID, VisitID};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: UserID,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Favorite {
    pub id: FavoriteID,
    pub user_id: UserID,
    pub movie_id: MovieID,
    pub created_at: DateTime<Utc>,
}

/// One handled HTTP request, recorded for the back-office audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserVisit {
    pub id: VisitID,
    pub user_id: Option<UserID>,
    pub path: String,
    pub method: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub visited_at: DateTime<Utc>,
}
