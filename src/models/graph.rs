// Merged dependency graph handed to the rendering layer.

use serde::{Deserialize, Serialize};

use super::{DataplaneSummary, EdgeStat, NodeStat};

/// A known service with its traffic stats (zero-valued when it produced no samples).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub stats: NodeStat,
    pub status: String,
    pub dataplanes: DataplaneSummary,
}

impl GraphNode {
    pub fn name(&self) -> &str {
        &self.stats.name
    }
}

/// Nodes sorted by name, edges sorted by edge id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeStat>,
}
