use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::cache::key::recipe_key;
use crate::cache::CacheStore;
use crate::database::RecipeRepository;
use crate::models::Recipe;

use super::error::{ApiError, ApiResult};
use super::response::success;
use super::AppState;

/// TTL for the cached recipe representation; rating mutations remove the
/// entry before it expires.
const RECIPE_TTL: Duration = Duration::from_secs(60 * 60);

/// Recipe read through the `Recipe-<id>` cache entry.
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let key = recipe_key(&id);

    if let Some(cached) = state.cache.get(&key).await {
        if let Ok(recipe) = serde_json::from_slice::<Recipe>(&cached) {
            tracing::debug!("Recipe cache hit: {}", key);
            return Ok(success(recipe));
        }
        // Unreadable entry (e.g. written by an older build); drop and refetch
        state.cache.remove(&key).await;
    }

    let recipe = state
        .database
        .repository()
        .find_recipe(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    match serde_json::to_vec(&recipe) {
        Ok(serialized) => state.cache.set(&key, serialized, RECIPE_TTL).await,
        Err(e) => tracing::warn!("Failed to serialize recipe {} for cache: {}", id, e),
    }

    Ok(success(recipe))
}
