pub mod lifecycle;
pub mod ratings;

pub use lifecycle::StatusPolicy;
pub use ratings::aggregate;
