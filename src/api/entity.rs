use crate::api::{parse_object, ApiError, AppState};
use crate::world::Attributes;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Create entity API router
pub fn create_entity_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/entity/:entity",
            get(get_entity).post(replace_entity).put(merge_entity),
        )
        .with_state(state)
}

/// GET /entity/:entity - Current attributes (`{}` if unknown)
async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> Json<Attributes> {
    Json(state.store.get(&entity))
}

/// POST /entity/:entity - Replace the entity wholesale
async fn replace_entity(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    body: Bytes,
) -> Result<Json<Attributes>, ApiError> {
    let data = parse_object(&body)?;
    info!(entity = %entity, attributes = data.len(), "Replacing entity");
    Ok(Json(state.store.set(&entity, data)))
}

/// PUT /entity/:entity - Merge attributes one key at a time
async fn merge_entity(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    body: Bytes,
) -> Result<Json<Attributes>, ApiError> {
    let data = parse_object(&body)?;
    info!(entity = %entity, attributes = data.len(), "Merging entity");
    Ok(Json(state.store.merge(&entity, data)))
}
