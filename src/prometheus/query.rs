// PromQL templates for the six node-graph queries.
// Every query shares one label selector and one window; only the latency queries take a quantile.

use std::fmt;
use std::time::Duration;

use crate::models::{EdgeStat, NodeStat, ResponseClass, Sample};

/// Label selector restricting a query to one mesh and optionally one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub mesh: String,
    pub zone: Option<String>,
}

impl Selector {
    /// An empty zone means "all zones".
    pub fn new(mesh: impl Into<String>, zone: Option<String>) -> Self {
        Self {
            mesh: mesh.into(),
            zone: zone.filter(|z| !z.is_empty()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh=\"{}\"", self.mesh)?;
        if let Some(zone) = &self.zone {
            write!(f, ",zone=\"{}\"", zone)?;
        }
        Ok(())
    }
}

/// Range-vector window in whole milliseconds (sub-millisecond part truncated), e.g. `60000ms`.
pub fn window_literal(window: Duration) -> String {
    format!("{}ms", window.as_millis())
}

/// Updates the counters one query is responsible for, given the entries resolved for a sample.
pub type AssignFn = fn(&mut NodeStat, &mut EdgeStat, &Sample);

/// The six queries issued per aggregation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    ResponseClasses,
    EdgeLatencyP50,
    EdgeLatencyP99,
    NodeLatencyP50,
    NodeLatencyP99,
    RequestRate,
}

impl QueryKind {
    pub const ALL: [QueryKind; 6] = [
        QueryKind::ResponseClasses,
        QueryKind::EdgeLatencyP50,
        QueryKind::EdgeLatencyP99,
        QueryKind::NodeLatencyP50,
        QueryKind::NodeLatencyP99,
        QueryKind::RequestRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::ResponseClasses => "response_classes",
            QueryKind::EdgeLatencyP50 => "edge_latency_p50",
            QueryKind::EdgeLatencyP99 => "edge_latency_p99",
            QueryKind::NodeLatencyP50 => "node_latency_p50",
            QueryKind::NodeLatencyP99 => "node_latency_p99",
            QueryKind::RequestRate => "request_rate",
        }
    }

    /// Builds the PromQL string for this query.
    pub fn promql(&self, selector: &Selector, window: Duration) -> String {
        let window = window_literal(window);
        match self {
            QueryKind::ResponseClasses => format!(
                "sum by (kuma_io_service,envoy_cluster_name,envoy_response_code_class) (delta(envoy_cluster_upstream_rq_xx{{{selector}}}[{window}])) != 0"
            ),
            QueryKind::EdgeLatencyP50 => edge_latency("0.5", selector, &window),
            QueryKind::EdgeLatencyP99 => edge_latency("0.99", selector, &window),
            QueryKind::NodeLatencyP50 => node_latency("0.5", selector, &window),
            QueryKind::NodeLatencyP99 => node_latency("0.99", selector, &window),
            QueryKind::RequestRate => format!(
                "sum by (kuma_io_service,envoy_cluster_name) (rate(envoy_cluster_upstream_rq_total{{{selector}}}[{window}])) != 0"
            ),
        }
    }

    /// The fold applied to each sample of this query's result.
    pub fn assign(&self) -> AssignFn {
        match self {
            QueryKind::ResponseClasses => add_response_class,
            QueryKind::EdgeLatencyP50 => set_edge_p50,
            QueryKind::EdgeLatencyP99 => set_edge_p99,
            QueryKind::NodeLatencyP50 => set_node_p50,
            QueryKind::NodeLatencyP99 => set_node_p99,
            QueryKind::RequestRate => add_request_rate,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn edge_latency(quantile: &str, selector: &Selector, window: &str) -> String {
    format!(
        "histogram_quantile({quantile}, sum by (kuma_io_service, envoy_cluster_name, le) (rate(envoy_cluster_upstream_rq_time_bucket{{{selector}}}[{window}])))"
    )
}

fn node_latency(quantile: &str, selector: &Selector, window: &str) -> String {
    format!(
        "histogram_quantile({quantile}, sum by (envoy_cluster_name, le) (rate(envoy_cluster_upstream_rq_time_bucket{{{selector}}}[{window}])))"
    )
}

/// Rounds a latency up to whole milliseconds. NaN (no observations) and negatives become 0.
fn latency_ms(value: f64) -> u64 {
    value.ceil() as u64
}

/// Truncates a delta to a whole request count. Negative deltas (counter resets) become 0.
fn request_count(value: f64) -> u64 {
    value as u64
}

fn add_response_class(node: &mut NodeStat, edge: &mut EdgeStat, sample: &Sample) {
    let Some(class) = ResponseClass::from_label(sample.label("envoy_response_code_class")) else {
        return;
    };
    let n = request_count(sample.value);
    node.requests.add(class, n);
    edge.requests.add(class, n);
}

fn set_edge_p50(_: &mut NodeStat, edge: &mut EdgeStat, sample: &Sample) {
    edge.latency_p50_ms = latency_ms(sample.value);
}

fn set_edge_p99(_: &mut NodeStat, edge: &mut EdgeStat, sample: &Sample) {
    edge.latency_p99_ms = latency_ms(sample.value);
}

fn set_node_p50(node: &mut NodeStat, _: &mut EdgeStat, sample: &Sample) {
    node.latency_p50_ms = latency_ms(sample.value);
}

fn set_node_p99(node: &mut NodeStat, _: &mut EdgeStat, sample: &Sample) {
    node.latency_p99_ms = latency_ms(sample.value);
}

fn add_request_rate(node: &mut NodeStat, edge: &mut EdgeStat, sample: &Sample) {
    node.rps += sample.value;
    edge.rps += sample.value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EdgeKey;

    #[test]
    fn selector_without_zone() {
        assert_eq!(Selector::new("default", None).to_string(), r#"mesh="default""#);
        assert_eq!(
            Selector::new("default", Some(String::new())).to_string(),
            r#"mesh="default""#
        );
    }

    #[test]
    fn selector_with_zone() {
        assert_eq!(
            Selector::new("default", Some("east".into())).to_string(),
            r#"mesh="default",zone="east""#
        );
    }

    #[test]
    fn window_truncates_to_millis() {
        assert_eq!(window_literal(Duration::from_micros(1_500_900)), "1500ms");
        assert_eq!(window_literal(Duration::from_secs(60)), "60000ms");
    }

    #[test]
    fn response_class_query_shape() {
        let q = QueryKind::ResponseClasses.promql(
            &Selector::new("m", Some("z".into())),
            Duration::from_secs(1),
        );
        assert_eq!(
            q,
            r#"sum by (kuma_io_service,envoy_cluster_name,envoy_response_code_class) (delta(envoy_cluster_upstream_rq_xx{mesh="m",zone="z"}[1000ms])) != 0"#
        );
    }

    #[test]
    fn latency_query_shapes() {
        let sel = Selector::new("m", None);
        let w = Duration::from_millis(500);
        assert_eq!(
            QueryKind::EdgeLatencyP99.promql(&sel, w),
            r#"histogram_quantile(0.99, sum by (kuma_io_service, envoy_cluster_name, le) (rate(envoy_cluster_upstream_rq_time_bucket{mesh="m"}[500ms])))"#
        );
        assert_eq!(
            QueryKind::NodeLatencyP50.promql(&sel, w),
            r#"histogram_quantile(0.5, sum by (envoy_cluster_name, le) (rate(envoy_cluster_upstream_rq_time_bucket{mesh="m"}[500ms])))"#
        );
    }

    #[test]
    fn request_rate_query_shape() {
        let q = QueryKind::RequestRate.promql(&Selector::new("m", None), Duration::from_secs(2));
        assert_eq!(
            q,
            r#"sum by (kuma_io_service,envoy_cluster_name) (rate(envoy_cluster_upstream_rq_total{mesh="m"}[2000ms])) != 0"#
        );
    }

    #[test]
    fn all_queries_are_distinct() {
        let sel = Selector::new("m", None);
        let mut queries: Vec<String> = QueryKind::ALL
            .iter()
            .map(|k| k.promql(&sel, Duration::from_secs(1)))
            .collect();
        queries.sort();
        queries.dedup();
        assert_eq!(queries.len(), 6);
    }

    #[test]
    fn latency_rounds_up_and_nan_is_zero() {
        let mut node = NodeStat::empty("b");
        let mut edge = EdgeStat::new(&EdgeKey::new("a", "b"));
        let sample = Sample::new([("envoy_cluster_name", "b")], 12.1);
        QueryKind::NodeLatencyP99.assign()(&mut node, &mut edge, &sample);
        assert_eq!(node.latency_p99_ms, 13);
        assert_eq!(edge.latency_p99_ms, 0);

        let nan = Sample::new([("envoy_cluster_name", "b")], f64::NAN);
        QueryKind::EdgeLatencyP50.assign()(&mut node, &mut edge, &nan);
        assert_eq!(edge.latency_p50_ms, 0);
    }

    #[test]
    fn unknown_response_class_is_ignored() {
        let mut node = NodeStat::empty("b");
        let mut edge = EdgeStat::new(&EdgeKey::new("a", "b"));
        let sample = Sample::new([("envoy_response_code_class", "1")], 5.0);
        QueryKind::ResponseClasses.assign()(&mut node, &mut edge, &sample);
        assert_eq!(node.total(), 0);
        assert_eq!(edge.requests.total(), 0);
    }

    #[test]
    fn infinite_delta_saturates_without_overflow() {
        let mut node = NodeStat::empty("b");
        let mut edge = EdgeStat::new(&EdgeKey::new("a", "b"));
        let ok = Sample::new([("envoy_response_code_class", "2")], f64::INFINITY);
        QueryKind::ResponseClasses.assign()(&mut node, &mut edge, &ok);
        assert_eq!(node.requests.req_2xx, u64::MAX);
        assert_eq!(node.slo(), 100);

        let failed = Sample::new([("envoy_response_code_class", "5")], 1e19);
        QueryKind::ResponseClasses.assign()(&mut node, &mut edge, &failed);
        QueryKind::ResponseClasses.assign()(&mut node, &mut edge, &ok);
        assert_eq!(node.requests.req_2xx, u64::MAX);
        assert_eq!(node.total(), u64::MAX);
        assert_eq!(edge.requests.total(), u64::MAX);
        assert!(node.slo() <= 100);
        assert_eq!(node.slo(), 64);
    }

    #[test]
    fn negative_delta_clamps_to_zero() {
        let mut node = NodeStat::empty("b");
        let mut edge = EdgeStat::new(&EdgeKey::new("a", "b"));
        let sample = Sample::new([("envoy_response_code_class", "2")], -3.0);
        QueryKind::ResponseClasses.assign()(&mut node, &mut edge, &sample);
        assert_eq!(node.requests.req_2xx, 0);
    }
}
