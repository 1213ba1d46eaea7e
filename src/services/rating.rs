// Rating aggregator - keeps the denormalized recipe average consistent
// with the ratings collection and the cache.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::key::recipe_key;
use crate::cache::CacheStore;
use crate::database::RecipeRepository;
use crate::models::Recipe;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Rating score must be between 1 and 5")]
    InvalidScore,

    #[error("Recipe not found")]
    RecipeNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("You cannot rate your own recipe")]
    SelfRatingNotAllowed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Applies rating mutations and recomputes the recipe's average.
///
/// The row mutation and the average update commit as one transaction (see
/// `RecipeRepository`); the cached recipe representation is dropped after
/// the commit so the next read observes the new aggregate.
pub struct RatingAggregator {
    repository: Arc<dyn RecipeRepository>,
    cache: Arc<dyn CacheStore>,
}

impl RatingAggregator {
    pub fn new(repository: Arc<dyn RecipeRepository>, cache: Arc<dyn CacheStore>) -> Self {
        Self { repository, cache }
    }

    /// Records `user_id`'s score for a recipe (first vote or re-vote) and
    /// returns the recipe with its updated average.
    pub async fn rate(
        &self,
        recipe_id: &str,
        user_id: &str,
        score: i32,
    ) -> Result<Recipe, RatingError> {
        if !(1..=5).contains(&score) {
            return Err(RatingError::InvalidScore);
        }

        let mut recipe = self
            .repository
            .find_recipe(recipe_id)
            .await?
            .ok_or(RatingError::RecipeNotFound)?;

        if !self.repository.user_exists(user_id).await? {
            return Err(RatingError::UserNotFound);
        }
        if recipe.author_id == user_id {
            return Err(RatingError::SelfRatingNotAllowed);
        }

        recipe.average_rating = self
            .repository
            .apply_rating(recipe_id, user_id, score)
            .await?;

        self.invalidate(recipe_id).await;
        tracing::debug!(
            "Recipe {} rated {} by {}, new average {}",
            recipe_id,
            score,
            user_id,
            recipe.average_rating
        );

        Ok(recipe)
    }

    /// Retracts `user_id`'s rating, if any, and returns the recipe with its
    /// updated average (`0` once no ratings remain).
    pub async fn unrate(&self, recipe_id: &str, user_id: &str) -> Result<Recipe, RatingError> {
        let mut recipe = self
            .repository
            .find_recipe(recipe_id)
            .await?
            .ok_or(RatingError::RecipeNotFound)?;

        recipe.average_rating = self.repository.remove_rating(recipe_id, user_id).await?;

        self.invalidate(recipe_id).await;
        tracing::debug!(
            "Rating by {} removed from recipe {}, new average {}",
            user_id,
            recipe_id,
            recipe.average_rating
        );

        Ok(recipe)
    }

    async fn invalidate(&self, recipe_id: &str) {
        self.cache.remove(&recipe_key(recipe_id)).await;
    }
}
