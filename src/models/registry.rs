// Mesh registry resources (service insights, meshes, zones).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of a registry listing. `next` is the absolute URL of the following page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInsight {
    #[serde(rename = "type", default)]
    pub type_: String,
    pub mesh: String,
    pub name: String,
    #[serde(default, alias = "creation_time")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "modificationtime")]
    pub modification_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dataplanes: DataplaneSummary,
}

/// Online/offline/total counts of the proxies backing a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataplaneSummary {
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub offline: u32,
    #[serde(default)]
    pub total: u32,
}

impl DataplaneSummary {
    pub fn online_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.online as u64 * 100) / self.total as u64;
        u32::try_from(percent).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for DataplaneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.online, self.offline, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(rename = "type", default)]
    pub type_: String,
    pub name: String,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modification_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    #[serde(flatten)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneIngress {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub ingress: ZoneIngress,
}

/// Registry index response, used for health checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub version: String,
}
