// Prometheus HTTP API client (instant queries only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::error::BackendError;
use crate::models::Sample;

/// A metrics backend able to evaluate an instant query. Shared by the concurrent query workers.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn instant_query(
        &self,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<Vec<Sample>, BackendError>;
}

pub struct PrometheusClient {
    client: Client,
    query_url: Url,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)?;
        let query_url = base.join(&format!(
            "{}/api/v1/query",
            base.path().trim_end_matches('/')
        ))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()?;
        Ok(Self { client, query_url })
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    #[instrument(skip(self), fields(backend = "prometheus", operation = "instant_query"))]
    async fn instant_query(
        &self,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<Vec<Sample>, BackendError> {
        let time = format!("{:.3}", time.timestamp_millis() as f64 / 1000.0);
        let response = self
            .client
            .get(self.query_url.clone())
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        parse_response(status.as_u16(), &body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum QueryData {
    Vector(Vec<VectorEntry>),
    Matrix(serde_json::Value),
    Scalar(serde_json::Value),
    String(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct VectorEntry {
    #[serde(default)]
    metric: HashMap<String, String>,
    value: (f64, String),
}

/// Decodes an instant-query response body. Prometheus reports query errors as JSON even on 4xx/5xx,
/// so the body is inspected before the status code.
pub(crate) fn parse_response(status: u16, body: &str) -> Result<Vec<Sample>, BackendError> {
    let parsed: ApiResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            if !(200..300).contains(&status) {
                return Err(BackendError::Status {
                    status,
                    body: body.to_string(),
                });
            }
            return Err(BackendError::Decode(e.to_string()));
        }
    };

    if parsed.status != "success" {
        return Err(BackendError::Query {
            error_type: parsed.error_type.unwrap_or_default(),
            message: parsed.error.unwrap_or_default(),
        });
    }
    if !(200..300).contains(&status) {
        return Err(BackendError::Status {
            status,
            body: body.to_string(),
        });
    }
    for warning in &parsed.warnings {
        warn!(warning = %warning, "prometheus query warning");
    }

    match parsed.data {
        Some(QueryData::Vector(entries)) => entries
            .into_iter()
            .map(|entry| {
                let value = parse_value(&entry.value.1)?;
                Ok(Sample {
                    labels: entry.metric,
                    value,
                })
            })
            .collect(),
        Some(QueryData::Matrix(_)) => Err(BackendError::UnexpectedResultType("matrix".into())),
        Some(QueryData::Scalar(_)) => Err(BackendError::UnexpectedResultType("scalar".into())),
        Some(QueryData::String(_)) => Err(BackendError::UnexpectedResultType("string".into())),
        None => Err(BackendError::Decode("missing data".into())),
    }
}

/// Sample values are strings; "NaN", "+Inf" and "-Inf" are valid.
fn parse_value(s: &str) -> Result<f64, BackendError> {
    s.parse::<f64>()
        .map_err(|_| BackendError::InvalidValue(s.to_string()))
}
