use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

/// Identity of the authenticated caller.
///
/// Authentication itself happens upstream; the auth layer resolves the
/// session and injects the user id as the `x-user-id` header before the
/// request reaches this service. Requests without it are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| CurrentUser(v.to_string()))
            .ok_or_else(|| ApiError::Unauthorized("Missing caller identity".to_string()))
    }
}
