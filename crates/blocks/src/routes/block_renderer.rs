//! Server-side block rendering endpoint.
//!
//! `GET /block-renderer/{namespace}/{name}?attributes=<json>` and
//! `POST /block-renderer/{namespace}/{name}` with `{"attributes": {...}}`
//! both respond with `{"rendered": "<html>"}`.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::Attributes;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the block renderer router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/block-renderer/{namespace}/{name}",
        get(render_get).post(render_post),
    )
}

#[derive(Deserialize)]
struct RenderParams {
    /// JSON-encoded attribute object.
    attributes: Option<String>,
}

#[derive(Deserialize)]
struct RenderRequest {
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Serialize)]
struct RenderResponse {
    rendered: String,
}

async fn render_get(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(params): Query<RenderParams>,
) -> AppResult<Json<RenderResponse>> {
    let attributes = match params.attributes.as_deref().map(str::trim) {
        None | Some("") => Attributes::new(),
        Some(raw) => serde_json::from_str::<Attributes>(raw)
            .map_err(|e| AppError::BadRequest(format!("attributes must be a JSON object: {e}")))?,
    };
    render(&state, &format!("{namespace}/{name}"), &attributes).await
}

async fn render_post(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Json(request): Json<RenderRequest>,
) -> AppResult<Json<RenderResponse>> {
    render(&state, &format!("{namespace}/{name}"), &request.attributes).await
}

async fn render(
    state: &AppState,
    block: &str,
    attributes: &Attributes,
) -> AppResult<Json<RenderResponse>> {
    state.blocks().validate(block, attributes)?;

    let rendered = state.blocks().render(block, attributes).await?;
    debug!(block, bytes = rendered.as_str().len(), "block rendered");

    Ok(Json(RenderResponse {
        rendered: rendered.into_string(),
    }))
}
