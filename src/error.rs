// Error taxonomy for the registry client, the metrics backend and graph aggregation.

use crate::prometheus::QueryKind;

/// A metrics-backend query failed.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("prometheus request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("prometheus returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("prometheus query error ({error_type}): {message}")]
    Query { error_type: String, message: String },
    #[error("prometheus response invalid: {0}")]
    Decode(String),
    #[error("expected a vector result, got {0}")]
    UnexpectedResultType(String),
    #[error("invalid sample value {0:?}")]
    InvalidValue(String),
    #[error("query cancelled")]
    Cancelled,
}

/// Listing entities from the mesh registry failed.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("registry returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("registry response invalid: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid registry url: {0}")]
    Url(String),
}

/// An aggregation call failed as a whole; no partial graph is produced.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("{kind} query failed: {source}")]
    Backend {
        kind: QueryKind,
        #[source]
        source: BackendError,
    },
}

impl GraphError {
    pub fn backend(kind: QueryKind, source: BackendError) -> Self {
        GraphError::Backend { kind, source }
    }
}
