use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{ApiError, FieldErrors},
    state::AppState,
    users::{
        dto::{to_wire, UserResponse},
        extractors::UserId,
        services::from_wire,
    },
};

/// `prefix` is either empty or starts with `/` and has no trailing slash.
pub fn collection_routes(prefix: &str) -> Router<AppState> {
    let router = Router::new().route(&format!("{prefix}/"), get(list_users).post(create_user));
    if prefix.is_empty() {
        router
    } else {
        router.route(prefix, get(list_users).post(create_user))
    }
}

pub fn item_routes(prefix: &str) -> Router<AppState> {
    let item = || get(get_user).put(update_user).patch(update_user).delete(delete_user);
    Router::new()
        .route(&format!("{prefix}/:id/"), item())
        .route(&format!("{prefix}/:id"), item())
}

fn rejected(errors: FieldErrors) -> ApiError {
    warn!(fields = ?errors.fields().collect::<Vec<_>>(), "user payload rejected");
    ApiError::Validation(errors)
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    debug!(count = users.len(), "users listed");
    Ok(Json(users.into_iter().map(to_wire).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, HeaderMap, Json<UserResponse>), ApiError> {
    let new = from_wire(&payload)
        .and_then(|changes| changes.into_new_user())
        .map_err(rejected)?;

    let user = state.users.create(new).await?;
    info!(user_id = user.id, username = %user, "user created");

    let mut headers = HeaderMap::new();
    let base = uri.path().trim_end_matches('/');
    if let Ok(location) = HeaderValue::from_str(&format!("{}/{}/", base, user.id)) {
        headers.insert(header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(to_wire(user))))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.find(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(to_wire(user)))
}

/// Serves both PUT and PATCH: present fields are merged over the stored row.
/// A missing id is a 404 whatever the payload holds.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    Json(payload): Json<Value>,
) -> Result<Json<UserResponse>, ApiError> {
    if state.users.find(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let changes = from_wire(&payload).map_err(rejected)?;
    if changes.is_empty() {
        debug!(user_id = id, "no fields supplied; refreshing timestamp only");
    }

    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = user.id, "user updated");
    Ok(Json(to_wire(user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<StatusCode, ApiError> {
    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
