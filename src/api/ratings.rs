use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::response::success;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub score: i32,
}

/// Rate a recipe (first vote or re-vote). Returns the recipe with its
/// updated average.
pub async fn rate_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<RateRequest>,
) -> ApiResult<impl IntoResponse> {
    let recipe = state
        .ratings
        .rate(&recipe_id, &user_id, request.score)
        .await?;
    Ok(success(recipe))
}

/// Retract the caller's rating for a recipe.
pub async fn remove_rating(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let recipe = state.ratings.unrate(&recipe_id, &user_id).await?;
    Ok(success(recipe))
}
