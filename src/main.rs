use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use receptoria_backend::api::{self, AppState};
use receptoria_backend::cache::{store::build_cache_store, CacheCleanupTask};
use receptoria_backend::database::Database;
use receptoria_backend::images::{DbOriginalBytesSource, ImagePipeline};
use receptoria_backend::services::RatingAggregator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize database
    let database = Database::new().await?;

    // Cache store selected once at startup; everything downstream sees the
    // capability interface only
    let cache = build_cache_store(database.pool());

    // Start cache cleanup task
    let cleanup_task = CacheCleanupTask::new(cache.clone(), Duration::from_secs(5 * 60));
    tokio::spawn(cleanup_task.start());

    // Wire the image pipeline and rating aggregator
    let source = Arc::new(DbOriginalBytesSource::new(database.pool().clone()));
    let pipeline = Arc::new(ImagePipeline::new(cache.clone(), source));
    let ratings = Arc::new(RatingAggregator::new(
        Arc::new(database.repository().clone()),
        cache.clone(),
    ));

    // Build our application with routes
    let app = Router::new()
        .route("/", get(|| async { "Receptoria Backend API v1.0" }))
        // Health and stats
        .route("/api/health", get(api::health::health_check))
        .route("/api/stats", get(api::health::get_stats))
        .route("/api/cache/cleanup", post(api::health::cleanup_cache))
        .route("/api/cache/clear", post(api::health::clear_cache))
        // Image delivery and replacement
        .route(
            "/api/images/recipe/:id",
            get(api::images::get_recipe_image).put(api::images::put_recipe_image),
        )
        .route(
            "/api/images/step/:id",
            get(api::images::get_step_image).put(api::images::put_step_image),
        )
        .route(
            "/api/images/avatar/:id",
            get(api::images::get_avatar_image).put(api::images::put_avatar_image),
        )
        // Recipes and ratings
        .route("/api/recipes/:id", get(api::recipes::get_recipe))
        .route(
            "/api/recipes/:id/rating",
            post(api::ratings::rate_recipe).delete(api::ratings::remove_rating),
        )
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            database,
            cache,
            pipeline,
            ratings,
        });

    // Run the server
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
