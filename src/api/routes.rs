//! API route configuration.

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

use super::handlers;
use super::state::AppState;

/// Create the API router. Methods other than POST get 405.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ansible", post(handlers::handle_ansible))
        .with_state(state)
}
