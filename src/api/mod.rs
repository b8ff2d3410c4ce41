// HTTP and WebSocket adapters over the world store

pub mod entity;
pub mod error;
pub mod websocket;
pub mod world;

pub use entity::create_entity_router;
pub use error::ApiError;
pub use websocket::{create_ws_router, ws_handler};
pub use world::create_world_router;

use crate::config::SubscriberConfig;
use crate::subscription::Broadcaster;
use crate::world::{Attributes, Store};
use axum::{response::Redirect, routing::get, Router};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Shared application state for every handler
pub struct AppState {
    pub store: Arc<Store>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(store: Arc<Store>, broadcaster: Arc<Broadcaster>) -> Self {
        Self { store, broadcaster }
    }

    /// Fresh empty world with a broadcaster attached as its listener
    pub fn from_config(config: SubscriberConfig) -> Self {
        let store = Arc::new(Store::new());
        let broadcaster = Arc::new(Broadcaster::new(config));
        broadcaster.attach(&store);
        Self::new(store, broadcaster)
    }
}

/// Full application router: entity/world APIs, /subscribe and static assets
pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/static/index.html") }))
        .merge(create_entity_router(Arc::clone(&state)))
        .merge(create_world_router(Arc::clone(&state)))
        .merge(create_ws_router(state))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
}

/// Parse a request body that must be a JSON object
pub(crate) fn parse_object(body: &[u8]) -> Result<Attributes, ApiError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::InvalidBody("expected a JSON object".to_string())),
    }
}
