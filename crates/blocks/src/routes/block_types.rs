//! Block type discovery.
//!
//! Lists registered block types with their attribute schemas.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::block::BlockTypeDefinition;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the block types router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/block-types", get(list_block_types))
        .route("/block-types/{namespace}/{name}", get(get_block_type))
}

async fn list_block_types(State(state): State<AppState>) -> Json<Vec<BlockTypeDefinition>> {
    Json(state.blocks().definitions().into_iter().cloned().collect())
}

async fn get_block_type(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> AppResult<Json<BlockTypeDefinition>> {
    let block = format!("{namespace}/{name}");
    state
        .blocks()
        .get(&block)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("unknown block type '{block}'")))
}
