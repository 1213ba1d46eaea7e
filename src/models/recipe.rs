use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A recipe as the rating path and the cached read path see it.
///
/// The main image BLOB is deliberately not part of this struct; image bytes
/// only move through `images::source::OriginalBytesSource`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: i32,    // 1 to 3
    pub time_to_cook: i32,  // minutes
    pub categories: String, // JSON array as string
    pub ingredients: String, // JSON array as string
    pub ingredient_count: i32,
    pub author_id: String,
    pub average_rating: f64, // derived from ratings, round(mean, 2)
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub recipe_id: String,
    pub step_number: i32,
    pub description: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rating {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub score: i32, // 1 to 5
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
