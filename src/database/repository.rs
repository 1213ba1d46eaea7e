use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::models::{Rating, Recipe};

/// Rounds an average to two decimals, matching the persisted aggregate.
pub fn round_average(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Persistence seam for recipes and their rating aggregate.
///
/// `apply_rating` and `remove_rating` run the rating mutation and the
/// average recomputation inside one transaction: a reader never observes a
/// rating row without its updated average, and a crash between the two steps
/// rolls both back.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn find_recipe(&self, id: &str) -> Result<Option<Recipe>, sqlx::Error>;
    async fn user_exists(&self, id: &str) -> Result<bool, sqlx::Error>;
    async fn find_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
    ) -> Result<Option<Rating>, sqlx::Error>;

    /// Upserts the caller's rating and recomputes the recipe average.
    /// Returns the new average.
    async fn apply_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
        score: i32,
    ) -> Result<f64, sqlx::Error>;

    /// Removes the caller's rating (a no-op if none exists) and recomputes
    /// the recipe average. Returns the new average, `0` when no ratings
    /// remain.
    async fn remove_rating(&self, recipe_id: &str, user_id: &str) -> Result<f64, sqlx::Error>;

    /// Replaces the stored image bytes for an owner entity.
    async fn update_recipe_image(&self, id: &str, image: &[u8]) -> Result<bool, sqlx::Error>;
    async fn update_step_image(&self, id: &str, image: &[u8]) -> Result<bool, sqlx::Error>;
    async fn update_avatar(&self, user_id: &str, image: &[u8]) -> Result<bool, sqlx::Error>;
}

const RECIPE_COLUMNS: &str = "id, title, description, difficulty, time_to_cook, categories, \
     ingredients, ingredient_count, author_id, average_rating, created_at";

#[derive(Clone)]
pub struct SqliteRecipeRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRecipeRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeRepository for SqliteRecipeRepository {
    async fn find_recipe(&self, id: &str) -> Result<Option<Recipe>, sqlx::Error> {
        // Image BLOB excluded; bytes travel through OriginalBytesSource only
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {} FROM recipes WHERE id = ?",
            RECIPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn user_exists(&self, id: &str) -> Result<bool, sqlx::Error> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn find_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
    ) -> Result<Option<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            "SELECT id, recipe_id, user_id, score FROM ratings WHERE recipe_id = ? AND user_id = ?",
        )
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn apply_rating(
        &self,
        recipe_id: &str,
        user_id: &str,
        score: i32,
    ) -> Result<f64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO ratings (id, recipe_id, user_id, score) VALUES (?, ?, ?, ?)
             ON CONFLICT(recipe_id, user_id) DO UPDATE SET score = excluded.score",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(recipe_id)
        .bind(user_id)
        .bind(score)
        .execute(&mut *tx)
        .await?;

        let average: f64 = sqlx::query_scalar("SELECT AVG(score) FROM ratings WHERE recipe_id = ?")
            .bind(recipe_id)
            .fetch_one(&mut *tx)
            .await?;
        let average = round_average(average);

        sqlx::query("UPDATE recipes SET average_rating = ? WHERE id = ?")
            .bind(average)
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(average)
    }

    async fn remove_rating(&self, recipe_id: &str, user_id: &str) -> Result<f64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ratings WHERE recipe_id = ? AND user_id = ?")
            .bind(recipe_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let average: Option<f64> =
            sqlx::query_scalar("SELECT AVG(score) FROM ratings WHERE recipe_id = ?")
                .bind(recipe_id)
                .fetch_one(&mut *tx)
                .await?;
        let average = average.map(round_average).unwrap_or(0.0);

        sqlx::query("UPDATE recipes SET average_rating = ? WHERE id = ?")
            .bind(average)
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(average)
    }

    async fn update_recipe_image(&self, id: &str, image: &[u8]) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE recipes SET image = ? WHERE id = ?")
            .bind(image)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn update_step_image(&self, id: &str, image: &[u8]) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE steps SET image = ? WHERE id = ?")
            .bind(image)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn update_avatar(&self, user_id: &str, image: &[u8]) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
            .bind(image)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_average_to_two_decimals() {
        assert_eq!(round_average(10.0 / 3.0), 3.33);
        assert_eq!(round_average(11.0 / 3.0), 3.67);
        assert_eq!(round_average(4.0), 4.0);
    }
}
