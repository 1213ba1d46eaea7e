use std::str::FromStr;

use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

pub mod repository;
pub mod schema;

pub use repository::{RecipeRepository, SqliteRecipeRepository};

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    repository: SqliteRecipeRepository,
}

impl Database {
    pub async fn new() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./receptoria.db?mode=rwc".to_string());
        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .busy_timeout(std::time::Duration::from_secs(30));

        // SQLite single writer; one connection avoids lock contention
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        schema::verify_schema(&pool).await?;

        let stats = schema::get_database_stats(&pool).await?;
        tracing::info!(
            "Database initialized - Recipes: {}, Ratings: {}, Users: {}, Cache entries: {}",
            stats.recipe_count,
            stats.rating_count,
            stats.user_count,
            stats.cache_count
        );

        let repository = SqliteRecipeRepository::new(pool.clone());

        Ok(Self { pool, repository })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn repository(&self) -> &SqliteRecipeRepository {
        &self.repository
    }

    pub async fn get_stats(&self) -> Result<schema::DatabaseStats> {
        schema::get_database_stats(&self.pool).await
    }

    pub async fn verify_integrity(&self) -> Result<()> {
        schema::verify_schema(&self.pool).await
    }
}
