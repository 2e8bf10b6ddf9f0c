// Metrics backend: Prometheus client, node-graph query templates, fan-out and accumulation.

mod accumulate;
mod client;
mod dispatch;
mod query;

pub use accumulate::{Accumulator, DESTINATION_LABEL, SOURCE_LABEL, TrafficStats};
pub use client::{MetricsBackend, PrometheusClient};
pub use dispatch::query_node_graph;
pub use query::{AssignFn, QueryKind, Selector, window_literal};
