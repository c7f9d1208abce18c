//! HTTP route handlers.

pub mod block_renderer;
pub mod block_types;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router with tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(block_types::router())
        .merge(block_renderer::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
