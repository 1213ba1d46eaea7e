// Receptoria backend library
//
// Core functionality of the recipe service:
// - API routes
// - database access
// - the two-tier derived-content cache
// - the image delivery pipeline
// - rating aggregation

pub mod api;
pub mod cache;
pub mod database;
pub mod images;
pub mod models;
pub mod services;
