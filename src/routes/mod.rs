// HTTP routes: mesh graph queries, registry listings, health, version

mod error;
mod graph;
mod http;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::prometheus::MetricsBackend;
use crate::registry::Registry;

pub use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) backend: Arc<dyn MetricsBackend>,
    pub(crate) config: AppConfig,
}

pub fn app(
    registry: Arc<dyn Registry>,
    backend: Arc<dyn MetricsBackend>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        registry,
        backend,
        config,
    };
    Router::new()
        .route("/", get(|| async { "Hello from meshgraph!" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/health", get(http::health_handler)) // GET /health
        .route("/api/meshes", get(http::meshes_handler)) // GET /api/meshes
        .route("/api/zones", get(http::zones_handler)) // GET /api/zones
        .route("/api/meshes/{mesh}/graph", get(graph::graph_handler)) // GET /api/meshes/{mesh}/graph
        .route("/api/query", post(graph::query_handler)) // POST /api/query
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
