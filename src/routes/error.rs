// Error responses: upstream failures are reported verbatim.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::{GraphError, RegistryError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(String),
    Timeout(String),
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m),
            ApiError::Timeout(m) => (StatusCode::GATEWAY_TIMEOUT, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
