use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::cache::ImageOwnerKind;
use crate::database::RecipeRepository;
use crate::images::ImageFormat;

use super::error::{ApiError, ApiResult};
use super::response::success_message;
use super::AppState;

/// Successful image responses are publicly cacheable for one day.
const CACHE_CONTROL: &str = "public, max-age=86400";

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub w: Option<u32>,
    pub h: Option<u32>,
}

impl ImageQuery {
    /// Width/height must be positive when present.
    fn validated(&self) -> Result<(Option<u32>, Option<u32>), ApiError> {
        if self.w == Some(0) || self.h == Some(0) {
            return Err(ApiError::BadRequest(
                "Image dimensions must be positive".to_string(),
            ));
        }
        Ok((self.w, self.h))
    }
}

pub async fn get_recipe_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ImageQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_image(&state, ImageOwnerKind::Recipe, &id, &params, &headers).await
}

pub async fn get_step_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ImageQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_image(&state, ImageOwnerKind::Step, &id, &params, &headers).await
}

pub async fn get_avatar_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ImageQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_image(&state, ImageOwnerKind::Avatar, &id, &params, &headers).await
}

async fn serve_image(
    state: &AppState,
    kind: ImageOwnerKind,
    id: &str,
    params: &ImageQuery,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let (width, height) = params.validated()?;

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let format = ImageFormat::negotiate(accept);

    let bytes = state
        .pipeline
        .handle(kind, id, width, height, format)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} image not found", kind)))?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type()),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        bytes,
    )
        .into_response())
}

pub async fn put_recipe_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    store_image(&state, ImageOwnerKind::Recipe, &id, &body).await
}

pub async fn put_step_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    store_image(&state, ImageOwnerKind::Step, &id, &body).await
}

pub async fn put_avatar_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    store_image(&state, ImageOwnerKind::Avatar, &id, &body).await
}

/// Replaces the owner's stored image bytes and drops the cached original so
/// the next request re-reads the new bytes. Already-cached resized variants
/// expire on their own TTL.
async fn store_image(
    state: &AppState,
    kind: ImageOwnerKind,
    id: &str,
    body: &[u8],
) -> ApiResult<impl IntoResponse> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Image body is empty".to_string()));
    }

    let repository = state.database.repository();
    let updated = match kind {
        ImageOwnerKind::Recipe => repository.update_recipe_image(id, body).await?,
        ImageOwnerKind::Step => repository.update_step_image(id, body).await?,
        ImageOwnerKind::Avatar => repository.update_avatar(id, body).await?,
    };

    if !updated {
        return Err(ApiError::NotFound(format!("{} not found", kind)));
    }

    state.pipeline.invalidate_original(kind, id).await;
    tracing::info!("Replaced {} image for {} ({} bytes)", kind, id, body.len());

    Ok(success_message("Image updated"))
}
