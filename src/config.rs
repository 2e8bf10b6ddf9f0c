use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub prometheus: PrometheusConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Control-plane API base URL, e.g. http://kuma-control-plane:5681
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Items requested per page when listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Window used when a query does not carry its own interval.
    #[serde(default = "default_window_ms")]
    pub default_window_ms: u64,
    /// Deadline for one mesh graph request (registry listing plus the six queries).
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_window_ms: default_window_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        validate_url("registry.url", &self.registry.url)?;
        anyhow::ensure!(
            self.registry.timeout_ms > 0,
            "registry.timeout_ms must be > 0, got {}",
            self.registry.timeout_ms
        );
        anyhow::ensure!(
            self.registry.page_size > 0,
            "registry.page_size must be > 0, got {}",
            self.registry.page_size
        );
        validate_url("prometheus.url", &self.prometheus.url)?;
        anyhow::ensure!(
            self.prometheus.timeout_ms > 0,
            "prometheus.timeout_ms must be > 0, got {}",
            self.prometheus.timeout_ms
        );
        anyhow::ensure!(
            self.graph.default_window_ms > 0,
            "graph.default_window_ms must be > 0, got {}",
            self.graph.default_window_ms
        );
        anyhow::ensure!(
            self.graph.query_timeout_ms > 0,
            "graph.query_timeout_ms must be > 0, got {}",
            self.graph.query_timeout_ms
        );
        Ok(())
    }
}

fn validate_url(key: &str, url: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!url.is_empty(), "{} must be non-empty", key);
    let parsed = reqwest::Url::parse(url).map_err(|e| anyhow::anyhow!("{}: {}", key, e))?;
    anyhow::ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "{} must be an http or https url, got {}",
        key,
        url
    );
    Ok(())
}
