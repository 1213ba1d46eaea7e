pub mod rating;

pub use rating::{RatingAggregator, RatingError};
