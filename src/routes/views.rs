// Node-graph rows for the frontend: stats plus derived metrics, one row per node/edge.

use serde::Serialize;

use crate::models::{EdgeStat, GraphNode, MeshGraph, ResponseClass};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub title: String,
    pub ratio_2xx: f64,
    pub ratio_3xx: f64,
    pub ratio_4xx: f64,
    pub ratio_5xx: f64,
    pub rps: f64,
    pub slo: u64,
    pub status: String,
    /// Dataplanes online/offline/total.
    pub dataplanes: String,
    /// Request counts 2xx/3xx/4xx/5xx/total.
    pub requests: String,
    pub latency_p50_ms: u64,
    pub latency_p99_ms: u64,
}

impl From<&GraphNode> for NodeView {
    fn from(node: &GraphNode) -> Self {
        let s = &node.stats;
        let r = &s.requests;
        Self {
            id: s.name.clone(),
            title: s.name.clone(),
            ratio_2xx: s.ratio(ResponseClass::Class2xx),
            ratio_3xx: s.ratio(ResponseClass::Class3xx),
            ratio_4xx: s.ratio(ResponseClass::Class4xx),
            ratio_5xx: s.ratio(ResponseClass::Class5xx),
            rps: s.rps,
            slo: s.slo(),
            status: node.status.clone(),
            dataplanes: node.dataplanes.to_string(),
            requests: format!(
                "{}/{}/{}/{}/{}",
                r.req_2xx,
                r.req_3xx,
                r.req_4xx,
                r.req_5xx,
                r.total()
            ),
            latency_p50_ms: s.latency_p50_ms,
            latency_p99_ms: s.latency_p99_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub id: String,
    pub source: String,
    pub target: String,
    pub rps: f64,
    pub slo: u64,
    /// Request counts 2xx/3xx/4xx/5xx.
    pub requests: String,
    pub latency_p50_ms: u64,
    pub latency_p99_ms: u64,
}

impl From<&EdgeStat> for EdgeView {
    fn from(edge: &EdgeStat) -> Self {
        let r = &edge.requests;
        Self {
            id: edge.id(),
            source: edge.origin.clone(),
            target: edge.destination.clone(),
            rps: edge.rps,
            slo: edge.slo(),
            requests: format!("{}/{}/{}/{}", r.req_2xx, r.req_3xx, r.req_4xx, r.req_5xx),
            latency_p50_ms: edge.latency_p50_ms,
            latency_p99_ms: edge.latency_p99_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl From<&MeshGraph> for GraphView {
    fn from(graph: &MeshGraph) -> Self {
        Self {
            nodes: graph.nodes.iter().map(NodeView::from).collect(),
            edges: graph.edges.iter().map(EdgeView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamesView {
    pub names: Vec<String>,
}
