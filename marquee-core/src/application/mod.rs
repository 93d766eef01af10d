pub mod catalog;
pub mod movies;
pub mod ratings;
pub mod unit_of_work;

pub use catalog::CatalogService;
pub use movies::MovieService;
pub use ratings::RatingService;
pub use unit_of_work::AppUnitOfWork;
