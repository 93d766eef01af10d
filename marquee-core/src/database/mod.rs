//! Persistence ports and their adapters.

pub mod infrastructure;
pub mod ports;
