use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use tracing::debug;

use crate::error::ApiError;

/// `:id` segment of the item route. Anything that is not an `i64` cannot name
/// a user, so it is a 404 rather than a bad request.
pub struct UserId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(UserId(id)),
            Err(rejection) => {
                debug!(error = %rejection, "unroutable user id");
                Err(ApiError::NotFound)
            }
        }
    }
}
