pub mod auth;
pub mod error;
pub mod health;
pub mod images;
pub mod ratings;
pub mod recipes;
pub mod response;

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::database::Database;
use crate::images::ImagePipeline;
use crate::services::RatingAggregator;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub cache: Arc<dyn CacheStore>,
    pub pipeline: Arc<ImagePipeline>,
    pub ratings: Arc<RatingAggregator>,
}
