use anyhow::Result;
use sqlx::{Pool, Row, Sqlite};

/// Verifies the migrated schema contains everything the core depends on.
pub async fn verify_schema(pool: &Pool<Sqlite>) -> Result<()> {
    let required_tables = vec!["users", "recipes", "steps", "ratings", "cache_entries"];

    for table in required_tables {
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
            .bind(table)
            .fetch_optional(pool)
            .await?;

        if exists.is_none() {
            return Err(anyhow::anyhow!("Required table '{}' does not exist", table));
        }
    }

    let required_indexes = vec![
        "idx_recipes_author",
        "idx_steps_recipe",
        "idx_ratings_recipe",
        "idx_cache_expires",
    ];

    for index in required_indexes {
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type='index' AND name=?")
            .bind(index)
            .fetch_optional(pool)
            .await?;

        if exists.is_none() {
            return Err(anyhow::anyhow!("Required index '{}' does not exist", index));
        }
    }

    let foreign_keys_enabled: i32 = sqlx::query("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await?
        .get(0);

    if foreign_keys_enabled != 1 {
        tracing::warn!("Foreign key constraints are not enabled");
    }

    tracing::info!("Database schema verification completed successfully");
    Ok(())
}

/// Row counts surfaced by the stats endpoint.
#[derive(Debug)]
pub struct DatabaseStats {
    pub recipe_count: i64,
    pub rating_count: i64,
    pub user_count: i64,
    pub cache_count: i64,
    pub database_size_bytes: i64,
}

impl DatabaseStats {
    pub fn database_size_mb(&self) -> f64 {
        self.database_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

pub async fn get_database_stats(pool: &Pool<Sqlite>) -> Result<DatabaseStats> {
    let recipe_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;

    let rating_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
        .fetch_one(pool)
        .await?;

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let cache_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
        .fetch_one(pool)
        .await?;

    let db_size: i64 = sqlx::query_scalar(
        "SELECT page_count * page_size as size FROM pragma_page_count(), pragma_page_size()",
    )
    .fetch_one(pool)
    .await?;

    Ok(DatabaseStats {
        recipe_count,
        rating_count,
        user_count,
        cache_count,
        database_size_bytes: db_size,
    })
}
