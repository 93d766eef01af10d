pub mod catalog;
pub mod favorites;
pub mod movies;
pub mod ratings;
pub mod users;
pub mod visits;
