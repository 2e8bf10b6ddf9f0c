// Shared test helpers: in-memory registry and metrics backend

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meshgraph::error::{BackendError, RegistryError};
use meshgraph::models::*;
use meshgraph::prometheus::{DESTINATION_LABEL, MetricsBackend, QueryKind, SOURCE_LABEL, Selector};
use meshgraph::registry::Registry;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const MESH: &str = "default";
pub const WINDOW: Duration = Duration::from_secs(60);

pub fn insight(mesh: &str, name: &str) -> ServiceInsight {
    ServiceInsight {
        type_: "ServiceInsight".into(),
        mesh: mesh.into(),
        name: name.into(),
        creation_time: None,
        modification_time: None,
        status: "online".into(),
        dataplanes: DataplaneSummary {
            online: 2,
            offline: 1,
            total: 3,
        },
    }
}

pub fn class_sample(src: &str, dest: &str, class: &str, value: f64) -> Sample {
    Sample::new(
        [
            (SOURCE_LABEL, src),
            (DESTINATION_LABEL, dest),
            ("envoy_response_code_class", class),
        ],
        value,
    )
}

pub fn edge_sample(src: &str, dest: &str, value: f64) -> Sample {
    Sample::new([(SOURCE_LABEL, src), (DESTINATION_LABEL, dest)], value)
}

pub fn node_sample(dest: &str, value: f64) -> Sample {
    Sample::new([(DESTINATION_LABEL, dest)], value)
}

#[derive(Clone)]
pub enum Reply {
    Samples(Vec<Sample>),
    /// Respond after a delay, to shuffle completion order.
    Delayed(Duration, Vec<Sample>),
    Fail(String),
    /// Never completes; counts as cancelled once dropped.
    Hang,
}

/// Drop counter for in-flight queries that never complete.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Metrics backend answering the six node-graph queries of one selector/window from canned replies.
/// Unknown queries get an empty vector.
pub struct FakeBackend {
    replies: Mutex<HashMap<String, Reply>>,
    queries: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub dropped: Arc<AtomicUsize>,
    selector: Selector,
    window: Duration,
}

impl FakeBackend {
    pub fn new(selector: Selector, window: Duration) -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            dropped: Arc::new(AtomicUsize::new(0)),
            selector,
            window,
        }
    }

    pub fn for_mesh(mesh: &str) -> Self {
        Self::new(Selector::new(mesh, None), WINDOW)
    }

    pub fn reply(self, kind: QueryKind, reply: Reply) -> Self {
        let query = kind.promql(&self.selector, self.window);
        self.replies.lock().unwrap().insert(query, reply);
        self
    }

    pub fn queries(&self) -> Vec<(String, DateTime<Utc>)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsBackend for FakeBackend {
    async fn instant_query(
        &self,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<Vec<Sample>, BackendError> {
        self.queries.lock().unwrap().push((query.to_string(), time));
        let reply = self.replies.lock().unwrap().get(query).cloned();
        match reply {
            None => Ok(vec![]),
            Some(Reply::Samples(s)) => Ok(s),
            Some(Reply::Delayed(d, s)) => {
                tokio::time::sleep(d).await;
                Ok(s)
            }
            Some(Reply::Fail(body)) => Err(BackendError::Status { status: 503, body }),
            Some(Reply::Hang) => {
                let _guard = DropCounter(self.dropped.clone());
                std::future::pending::<()>().await;
                Ok(vec![])
            }
        }
    }
}

/// Registry serving fixed listings, optionally failing every call.
#[derive(Default)]
pub struct FakeRegistry {
    pub insights: Vec<ServiceInsight>,
    pub meshes: Vec<String>,
    pub zones: Vec<String>,
    pub fail: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn with_services(mesh: &str, names: &[&str]) -> Self {
        Self {
            insights: names.iter().map(|n| insight(mesh, n)).collect(),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail {
            Some(body) => Err(RegistryError::Status {
                status: 500,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn meta(name: &str, type_: &str) -> Meta {
    Meta {
        type_: type_.into(),
        name: name.into(),
        creation_time: None,
        modification_time: None,
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn hello(&self) -> Result<Hello, RegistryError> {
        self.check()?;
        Ok(Hello {
            hostname: "cp-0".into(),
            tagline: "Kuma".into(),
            version: "2.0.0".into(),
        })
    }

    async fn list_meshes(&self) -> Result<Vec<Mesh>, RegistryError> {
        self.check()?;
        Ok(self
            .meshes
            .iter()
            .map(|n| Mesh {
                meta: meta(n, "Mesh"),
            })
            .collect())
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, RegistryError> {
        self.check()?;
        Ok(self
            .zones
            .iter()
            .map(|n| Zone {
                meta: meta(n, "Zone"),
                ingress: ZoneIngress::default(),
            })
            .collect())
    }

    async fn list_service_insights(&self, mesh: &str) -> Result<Vec<ServiceInsight>, RegistryError> {
        self.check()?;
        Ok(self
            .insights
            .iter()
            .filter(|i| i.mesh == mesh)
            .cloned()
            .collect())
    }
}
