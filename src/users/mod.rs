pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

/// Collection and item routes for the user resource, mounted under `prefix`.
pub fn router(prefix: &str) -> Router<AppState> {
    Router::new()
        .merge(handlers::collection_routes(prefix))
        .merge(handlers::item_routes(prefix))
}
