// Mesh graph handlers and the typed query endpoint.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::AppState;
use super::error::ApiError;
use super::http::{mesh_names, zone_names};
use super::views::GraphView;
use crate::graph::{GraphRequest, mesh_graph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    MeshGraph,
    Meshes,
    Zones,
}

impl FromStr for QueryType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mesh-graph" => Ok(QueryType::MeshGraph),
            "meshes" => Ok(QueryType::Meshes),
            "zones" => Ok(QueryType::Zones),
            _ => Err(ApiError::BadRequest("unknown query type".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QueryRequest {
    query_type: String,
    #[serde(default)]
    mesh: Option<String>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    interval_ms: Option<u64>,
    /// Evaluation time, unix milliseconds. Defaults to now.
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphParams {
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    window_ms: Option<u64>,
    /// Evaluation time, unix milliseconds. Defaults to now.
    #[serde(default)]
    time: Option<i64>,
}

/// GET /api/meshes/{mesh}/graph
pub(super) async fn graph_handler(
    State(state): State<AppState>,
    Path(mesh): Path<String>,
    Query(params): Query<GraphParams>,
) -> Result<Json<GraphView>, ApiError> {
    run_graph(&state, mesh, params.zone, params.window_ms, params.time)
        .await
        .map(Json)
}

/// POST /api/query: dispatches on `queryType`.
pub(super) async fn query_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Response, ApiError> {
    tracing::debug!(query_type = %req.query_type, mesh = ?req.mesh, "query received");
    match req.query_type.parse::<QueryType>()? {
        QueryType::MeshGraph => {
            let mesh = req
                .mesh
                .filter(|m| !m.is_empty())
                .ok_or_else(|| ApiError::BadRequest("mesh is required".into()))?;
            let view = run_graph(&state, mesh, req.zone, req.interval_ms, req.time).await?;
            Ok(Json(view).into_response())
        }
        QueryType::Meshes => Ok(Json(mesh_names(&state).await?).into_response()),
        QueryType::Zones => Ok(Json(zone_names(&state).await?).into_response()),
    }
}

/// Builds one mesh graph under the configured deadline. Timing out drops the aggregation, which
/// cancels the queries still in flight.
async fn run_graph(
    state: &AppState,
    mesh: String,
    zone: Option<String>,
    window_ms: Option<u64>,
    time: Option<i64>,
) -> Result<GraphView, ApiError> {
    let window_ms = window_ms.unwrap_or(state.config.graph.default_window_ms);
    if window_ms == 0 {
        return Err(ApiError::BadRequest("window must be > 0".into()));
    }
    let at = match time {
        Some(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid time {ms}")))?,
        None => Utc::now(),
    };
    let request = GraphRequest {
        mesh,
        zone: zone.filter(|z| !z.is_empty()),
        window: Duration::from_millis(window_ms),
        at,
    };

    let cancel = CancellationToken::new();
    let deadline = Duration::from_millis(state.config.graph.query_timeout_ms);
    let build = mesh_graph(
        state.registry.as_ref(),
        state.backend.clone(),
        &request,
        &cancel,
    );
    match tokio::time::timeout(deadline, build).await {
        Ok(Ok(graph)) => Ok(GraphView::from(&graph)),
        Ok(Err(e)) => {
            tracing::warn!(mesh = %request.mesh, error = %e, "mesh graph failed");
            Err(e.into())
        }
        Err(_) => {
            cancel.cancel();
            tracing::warn!(
                mesh = %request.mesh,
                timeout_ms = deadline.as_millis() as u64,
                "mesh graph timed out"
            );
            Err(ApiError::Timeout(format!(
                "mesh graph timed out after {}ms",
                deadline.as_millis()
            )))
        }
    }
}
