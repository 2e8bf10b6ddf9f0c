// Mesh graph aggregation: registry listing -> six concurrent queries -> merge against known services.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::models::{EdgeStat, GraphNode, MeshGraph, NodeStat, ServiceInsight};
use crate::prometheus::{MetricsBackend, Selector, TrafficStats, query_node_graph};
use crate::registry::Registry;

/// Parameters of one mesh graph query.
#[derive(Debug, Clone)]
pub struct GraphRequest {
    pub mesh: String,
    pub zone: Option<String>,
    pub window: Duration,
    pub at: DateTime<Utc>,
}

/// Builds the dependency graph of `request.mesh`.
///
/// The registry is listed first; if that fails no query is dispatched.
#[instrument(skip(registry, backend, cancel), fields(mesh = %request.mesh))]
pub async fn mesh_graph(
    registry: &dyn Registry,
    backend: Arc<dyn MetricsBackend>,
    request: &GraphRequest,
    cancel: &CancellationToken,
) -> Result<MeshGraph, GraphError> {
    let insights = registry.list_service_insights(&request.mesh).await?;
    let selector = Selector::new(request.mesh.clone(), request.zone.clone());
    let stats = query_node_graph(backend, &selector, request.window, request.at, cancel).await?;
    let graph = merge(&request.mesh, insights, stats);
    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "mesh graph built"
    );
    Ok(graph)
}

/// Intersects accumulated stats with the services known to the registry for `mesh`.
///
/// Every known service appears exactly once (zero-valued when it has no stats); stats for unknown
/// services are dropped, as are edges with an unknown endpoint. Nodes are sorted by name, edges by id.
pub fn merge(mesh: &str, insights: Vec<ServiceInsight>, stats: TrafficStats) -> MeshGraph {
    let known: BTreeMap<String, ServiceInsight> = insights
        .into_iter()
        .filter(|i| i.mesh == mesh)
        .map(|i| (i.name.clone(), i))
        .collect();

    let TrafficStats { mut nodes, edges } = stats;

    let graph_nodes: Vec<GraphNode> = known
        .iter()
        .map(|(name, insight)| GraphNode {
            stats: nodes.remove(name).unwrap_or_else(|| NodeStat::empty(name.clone())),
            status: insight.status.clone(),
            dataplanes: insight.dataplanes,
        })
        .collect();

    let mut graph_edges: Vec<EdgeStat> = edges
        .into_iter()
        .filter(|(key, _)| known.contains_key(&key.origin) && known.contains_key(&key.destination))
        .map(|(_, edge)| edge)
        .collect();
    // Distinct edges may share a display id when names contain the separator; the structured key
    // keeps the order deterministic.
    graph_edges.sort_by(|a, b| a.id().cmp(&b.id()).then_with(|| a.origin.cmp(&b.origin)));

    MeshGraph {
        nodes: graph_nodes,
        edges: graph_edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataplaneSummary, EdgeKey};

    fn insight(mesh: &str, name: &str) -> ServiceInsight {
        ServiceInsight {
            type_: "ServiceInsight".into(),
            mesh: mesh.into(),
            name: name.into(),
            creation_time: None,
            modification_time: None,
            status: "online".into(),
            dataplanes: DataplaneSummary {
                online: 1,
                offline: 0,
                total: 1,
            },
        }
    }

    fn stats_with(nodes: &[&str], edges: &[(&str, &str)]) -> TrafficStats {
        let mut stats = TrafficStats::default();
        for &n in nodes {
            let mut node = NodeStat::empty(n);
            node.requests.req_2xx = 1;
            stats.nodes.insert(n.to_string(), node);
        }
        for &(o, d) in edges {
            let key = EdgeKey::new(o, d);
            stats.edges.insert(key.clone(), EdgeStat::new(&key));
        }
        stats
    }

    #[test]
    fn node_set_equals_known_set() {
        let insights = vec![insight("m", "c"), insight("m", "a"), insight("m", "b")];
        let graph = merge("m", insights, stats_with(&["a", "x"], &[]));
        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(graph.nodes[0].stats.total(), 1);
        assert_eq!(graph.nodes[1].stats, NodeStat::empty("b"));
    }

    #[test]
    fn insights_from_other_meshes_are_not_known() {
        let insights = vec![insight("m", "a"), insight("other", "b")];
        let graph = merge("m", insights, stats_with(&[], &[("a", "b")]));
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn edges_need_both_endpoints_known() {
        let insights = vec![insight("m", "a"), insight("m", "b")];
        let graph = merge(
            "m",
            insights,
            stats_with(&[], &[("b", "a"), ("a", "b"), ("a", "z"), ("", "b")]),
        );
        let ids: Vec<String> = graph.edges.iter().map(EdgeStat::id).collect();
        assert_eq!(ids, vec!["a--b", "b--a"]);
    }

    #[test]
    fn duplicate_insights_yield_one_node() {
        let insights = vec![insight("m", "a"), insight("m", "a")];
        let graph = merge("m", insights, TrafficStats::default());
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn node_carries_registry_fields() {
        let graph = merge("m", vec![insight("m", "a")], TrafficStats::default());
        assert_eq!(graph.nodes[0].status, "online");
        assert_eq!(graph.nodes[0].dataplanes.to_string(), "1/0/1");
    }
}
