// Mesh registry (control plane) client: service insights, meshes, zones, index.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::RegistryError;
use crate::models::{Hello, ListResponse, Mesh, ServiceInsight, Zone};

/// Source of known entities. The graph only depends on `list_service_insights`.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn hello(&self) -> Result<Hello, RegistryError>;
    async fn list_meshes(&self) -> Result<Vec<Mesh>, RegistryError>;
    async fn list_zones(&self) -> Result<Vec<Zone>, RegistryError>;
    async fn list_service_insights(&self, mesh: &str) -> Result<Vec<ServiceInsight>, RegistryError>;
}

pub struct HttpRegistry {
    client: Client,
    base: Url,
    page_size: u32,
}

impl HttpRegistry {
    pub fn new(base_url: &str, timeout: Duration, page_size: u32) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()?;
        Ok(Self {
            client,
            base,
            page_size,
        })
    }

    fn url(&self, path: &str) -> Result<Url, RegistryError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| RegistryError::Url(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, RegistryError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Follows `next` links until the listing is exhausted or a page repeats.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RegistryError> {
        let mut url = self.url(path)?;
        url.query_pairs_mut()
            .append_pair("size", &self.page_size.to_string());

        let mut items = Vec::new();
        let mut visited = HashSet::new();
        loop {
            visited.insert(url.clone());
            let page: ListResponse<T> = self.get(url.clone()).await?;
            items.extend(page.items);
            let Some(next) = page.next.filter(|n| !n.is_empty()) else {
                break;
            };
            let next = self
                .base
                .join(&next)
                .map_err(|e| RegistryError::Url(e.to_string()))?;
            if visited.contains(&next) {
                warn!(path, next = %next, "registry pagination cycle, stopping");
                break;
            }
            url = next;
        }
        debug!(
            path,
            pages = visited.len(),
            items = items.len(),
            "registry listing fetched"
        );
        Ok(items)
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    #[instrument(skip(self), fields(repo = "registry", operation = "hello"))]
    async fn hello(&self) -> Result<Hello, RegistryError> {
        self.get(self.base.clone()).await
    }

    #[instrument(skip(self), fields(repo = "registry", operation = "list_meshes"))]
    async fn list_meshes(&self) -> Result<Vec<Mesh>, RegistryError> {
        self.get_all("meshes").await
    }

    #[instrument(skip(self), fields(repo = "registry", operation = "list_zones"))]
    async fn list_zones(&self) -> Result<Vec<Zone>, RegistryError> {
        self.get_all("zones").await
    }

    #[instrument(skip(self), fields(repo = "registry", operation = "list_service_insights"))]
    async fn list_service_insights(&self, mesh: &str) -> Result<Vec<ServiceInsight>, RegistryError> {
        self.get_all(&format!("meshes/{mesh}/service-insights")).await
    }
}
