pub mod visits;

pub use visits::record_visit;
