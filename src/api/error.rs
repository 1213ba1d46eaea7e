use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::images::ImageError;
use crate::services::RatingError;

/// Unified API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Database failure outside the rating path
    Database(sqlx::Error),
    /// Missing resource (not logged; expected traffic)
    NotFound(String),
    /// Missing or unusable caller identity
    Unauthorized(String),
    /// Rating-path validation failure with a stable error code
    Rating(RatingError),
    /// Internal failure, including corrupt stored image data
    Internal(String),
    /// Malformed request parameters
    BadRequest(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Database(e) => write!(f, "Database error: {}", e),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Rating(e) => write!(f, "Rating error: {}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::Database(err),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::Database(e) => ApiError::Database(e),
            other => ApiError::Rating(other),
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Source(e) => ApiError::Database(e),
            // Decode failures mean the stored bytes are corrupt; surface as
            // a server-side failure, never a 404
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "An internal database error occurred".to_string(),
                )
            }
            ApiError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            ApiError::Rating(ref e) => {
                let (status, code) = match e {
                    RatingError::InvalidScore => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "invalid_score")
                    }
                    RatingError::RecipeNotFound => (StatusCode::NOT_FOUND, "recipe_not_found"),
                    RatingError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
                    RatingError::SelfRatingNotAllowed => {
                        (StatusCode::FORBIDDEN, "self_rating_not_allowed")
                    }
                    RatingError::Database(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                    }
                };
                (status, code, e.to_string())
            }
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal server error occurred".to_string(),
                )
            }
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
