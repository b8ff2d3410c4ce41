use crate::api::{ApiError, AppState};
use crate::world::World;
use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Create world/clear API router
pub fn create_world_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/world", get(get_world).post(replace_world))
        .route("/clear", get(clear_world).post(clear_world))
        .with_state(state)
}

/// GET /world - Full world snapshot
async fn get_world(State(state): State<Arc<AppState>>) -> Json<World> {
    Json(state.store.world_snapshot())
}

/// POST /world - Clear, then apply every entity/attribute pair via update
async fn replace_world(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<World>, ApiError> {
    let world: World = serde_json::from_slice(&body)?;
    info!(entities = world.len(), "Replacing world");
    Ok(Json(state.store.replace_world(world)))
}

/// GET|POST /clear - Empty the world
async fn clear_world(State(state): State<Arc<AppState>>) -> Json<World> {
    state.store.clear();
    Json(state.store.world_snapshot())
}
