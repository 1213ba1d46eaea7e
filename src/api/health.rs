use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::cache::CacheStore;

use super::error::{ApiError, ApiResult};
use super::response::success;
use super::AppState;

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.database.verify_integrity().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::Internal("Database connection failed".to_string())
    })?;

    Ok(success(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "database": "connected"
    })))
}

/// System statistics.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let db_stats = state
        .database
        .get_stats()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get database stats: {}", e)))?;

    Ok(success(json!({
        "recipe_count": db_stats.recipe_count,
        "rating_count": db_stats.rating_count,
        "user_count": db_stats.user_count,
        "database_size_mb": db_stats.database_size_mb(),
        "cache_entries": state.cache.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Purge expired cache entries.
pub async fn cleanup_cache(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let dropped = state.cache.cleanup_expired().await;

    Ok(success(json!({
        "message": "Cache cleanup completed",
        "dropped": dropped,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Drop every cache entry.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.cache.clear().await;

    Ok(success(json!({
        "message": "All caches cleared",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
