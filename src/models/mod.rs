// Domain models: traffic stats, backend samples, registry resources, merged graph.

mod graph;
mod registry;
mod sample;
mod stats;

pub use graph::{GraphNode, MeshGraph};
pub use registry::{DataplaneSummary, Hello, ListResponse, Mesh, Meta, ServiceInsight, Zone, ZoneIngress};
pub use sample::Sample;
pub use stats::{EDGE_ID_SEPARATOR, EdgeKey, EdgeStat, NodeStat, RequestCounts, ResponseClass};
