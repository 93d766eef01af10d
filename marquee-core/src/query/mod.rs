pub mod pagination;

pub use pagination::{Page, PageRequest, PageWindow, RequestedPage};
