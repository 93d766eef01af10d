//! Core library for the Marquee movie showcase.
//!
//! Status and rating derivation live in [`domain`], the read-through listing
//! cache in [`infra::cache`], page recovery in [`query`], persistence ports and
//! adapters in [`database`], orchestration in [`application`] and the periodic
//! sweeps plus notification delivery in [`tasks`].

pub mod api;
pub mod application;
pub mod database;
pub mod domain;
pub mod error;
pub mod infra;
pub mod query;
pub mod tasks;

pub use error::{CatalogError, Result};

/// Embedded schema migrations for the Postgres adapter.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
