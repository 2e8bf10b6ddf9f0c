// Traffic statistics per node (destination service) and per edge (origin -> destination).
// Derived metrics are computed from the counters on every call, never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between origin and destination in the displayed edge id.
pub const EDGE_ID_SEPARATOR: &str = "--";

/// Coarse HTTP status bucket, as reported by Envoy's `envoy_response_code_class` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseClass {
    #[serde(rename = "2xx")]
    Class2xx,
    #[serde(rename = "3xx")]
    Class3xx,
    #[serde(rename = "4xx")]
    Class4xx,
    #[serde(rename = "5xx")]
    Class5xx,
}

impl ResponseClass {
    pub const ALL: [ResponseClass; 4] = [
        ResponseClass::Class2xx,
        ResponseClass::Class3xx,
        ResponseClass::Class4xx,
        ResponseClass::Class5xx,
    ];

    /// Parse the class label ("2".."5"). Other classes (1xx) are not tracked.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "2" => Some(ResponseClass::Class2xx),
            "3" => Some(ResponseClass::Class3xx),
            "4" => Some(ResponseClass::Class4xx),
            "5" => Some(ResponseClass::Class5xx),
            _ => None,
        }
    }
}

/// Request counts for the four response classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCounts {
    pub req_2xx: u64,
    pub req_3xx: u64,
    pub req_4xx: u64,
    pub req_5xx: u64,
}

impl RequestCounts {
    pub fn get(&self, class: ResponseClass) -> u64 {
        match class {
            ResponseClass::Class2xx => self.req_2xx,
            ResponseClass::Class3xx => self.req_3xx,
            ResponseClass::Class4xx => self.req_4xx,
            ResponseClass::Class5xx => self.req_5xx,
        }
    }

    pub fn add(&mut self, class: ResponseClass, n: u64) {
        let bucket = match class {
            ResponseClass::Class2xx => &mut self.req_2xx,
            ResponseClass::Class3xx => &mut self.req_3xx,
            ResponseClass::Class4xx => &mut self.req_4xx,
            ResponseClass::Class5xx => &mut self.req_5xx,
        };
        *bucket = bucket.saturating_add(n);
    }

    /// Sum of the four buckets, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.req_2xx
            .saturating_add(self.req_3xx)
            .saturating_add(self.req_4xx)
            .saturating_add(self.req_5xx)
    }

    /// Exact sum of the four buckets.
    fn wide_total(&self) -> u128 {
        self.req_2xx as u128 + self.req_3xx as u128 + self.req_4xx as u128 + self.req_5xx as u128
    }

    /// Share of requests in `class`. An empty set of counts reports 1 for every class,
    /// so a node without traffic renders as fully healthy.
    pub fn ratio(&self, class: ResponseClass) -> f64 {
        let total = self.wide_total();
        if total == 0 {
            return 1.0;
        }
        self.get(class) as f64 / total as f64
    }

    /// Percentage of requests that were not 5xx, truncated. 100 when there is no traffic.
    pub fn slo(&self) -> u64 {
        let total = self.wide_total();
        if total == 0 {
            return 100;
        }
        let not_5xx = total - self.req_5xx as u128;
        ((not_5xx * 100) / total) as u64
    }
}

/// Traffic received by one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStat {
    pub name: String,
    #[serde(flatten)]
    pub requests: RequestCounts,
    pub rps: f64,
    pub latency_p50_ms: u64,
    pub latency_p99_ms: u64,
}

impl NodeStat {
    /// Zero-valued stats for a known service that produced no samples.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn total(&self) -> u64 {
        self.requests.total()
    }

    pub fn ratio(&self, class: ResponseClass) -> f64 {
        self.requests.ratio(class)
    }

    pub fn slo(&self) -> u64 {
        self.requests.slo()
    }
}

/// Ordered (origin, destination) pair identifying an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub origin: String,
    pub destination: String,
}

impl EdgeKey {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.origin, EDGE_ID_SEPARATOR, self.destination)
    }
}

/// Traffic sent from one service to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStat {
    pub origin: String,
    pub destination: String,
    #[serde(flatten)]
    pub requests: RequestCounts,
    pub rps: f64,
    pub latency_p50_ms: u64,
    pub latency_p99_ms: u64,
}

impl EdgeStat {
    pub fn new(key: &EdgeKey) -> Self {
        Self {
            origin: key.origin.clone(),
            destination: key.destination.clone(),
            requests: RequestCounts::default(),
            rps: 0.0,
            latency_p50_ms: 0,
            latency_p99_ms: 0,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.origin.clone(), self.destination.clone())
    }

    /// Display and sort id: `origin--destination`.
    pub fn id(&self) -> String {
        format!("{}{}{}", self.origin, EDGE_ID_SEPARATOR, self.destination)
    }

    pub fn slo(&self) -> u64 {
        self.requests.slo()
    }
}
