// Folds query results into per-node and per-edge stats.
// Entries are created on first sight and never removed; one Accumulator per aggregation call.

use std::collections::HashMap;

use crate::models::{EdgeKey, EdgeStat, NodeStat, Sample};

/// Label carrying the calling service.
pub const SOURCE_LABEL: &str = "kuma_io_service";
/// Label carrying the called service.
pub const DESTINATION_LABEL: &str = "envoy_cluster_name";

/// Node stats keyed by service name and edge stats keyed by (origin, destination).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficStats {
    pub nodes: HashMap<String, NodeStat>,
    pub edges: HashMap<EdgeKey, EdgeStat>,
}

#[derive(Debug, Default)]
pub struct Accumulator {
    stats: TrafficStats,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the destination node and (source, destination) edge of every sample and hands both
    /// to `assign`. A missing label resolves to "" rather than dropping the sample.
    pub fn accumulate<F>(&mut self, samples: &[Sample], mut assign: F)
    where
        F: FnMut(&mut NodeStat, &mut EdgeStat, &Sample),
    {
        for sample in samples {
            let source = sample.label(SOURCE_LABEL);
            let destination = sample.label(DESTINATION_LABEL);

            let node = self
                .stats
                .nodes
                .entry(destination.to_string())
                .or_insert_with(|| NodeStat::empty(destination));
            let key = EdgeKey::new(source, destination);
            let edge = self
                .stats
                .edges
                .entry(key)
                .or_insert_with_key(EdgeStat::new);

            assign(node, edge, sample);
        }
    }

    pub fn node(&self, name: &str) -> Option<&NodeStat> {
        self.stats.nodes.get(name)
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&EdgeStat> {
        self.stats.edges.get(key)
    }

    pub fn finish(self) -> TrafficStats {
        self.stats
    }
}
