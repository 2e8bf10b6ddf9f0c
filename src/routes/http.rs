// GET handlers: version, health, registry listings

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use super::error::ApiError;
use super::views::NamesView;
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /health: checks that the registry answers; 503 with its error otherwise.
pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.registry.hello().await {
        Ok(hello) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "message": format!(
                    "received from: '{}' tagLine:{} version:{}",
                    hello.hostname, hello.tagline, hello.version
                ),
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string(),
                })),
            )
        }
    }
}

/// GET /api/meshes: mesh names.
pub(super) async fn meshes_handler(
    State(state): State<AppState>,
) -> Result<Json<NamesView>, ApiError> {
    mesh_names(&state).await.map(Json)
}

/// GET /api/zones: zone names.
pub(super) async fn zones_handler(
    State(state): State<AppState>,
) -> Result<Json<NamesView>, ApiError> {
    zone_names(&state).await.map(Json)
}

pub(super) async fn mesh_names(state: &AppState) -> Result<NamesView, ApiError> {
    let meshes = state.registry.list_meshes().await?;
    Ok(NamesView {
        names: meshes.into_iter().map(|m| m.meta.name).collect(),
    })
}

pub(super) async fn zone_names(state: &AppState) -> Result<NamesView, ApiError> {
    let zones = state.registry.list_zones().await?;
    Ok(NamesView {
        names: zones.into_iter().map(|z| z.meta.name).collect(),
    })
}
