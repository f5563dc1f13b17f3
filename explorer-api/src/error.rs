use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use explorer_governance::GovernanceError;
use explorer_types::{Network, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Network {0} is not served")]
    NetworkUnavailable(Network),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Governance(GovernanceError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Governance(GovernanceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Governance(GovernanceError::Upstream(StoreError::Timeout)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Governance(GovernanceError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Governance(GovernanceError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NetworkUnavailable(_) => StatusCode::NOT_FOUND,
            ApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(GovernanceError::Configuration("x".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(GovernanceError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ApiError::from(GovernanceError::Upstream(StoreError::Timeout)), StatusCode::GATEWAY_TIMEOUT),
            (
                ApiError::from(GovernanceError::Upstream(StoreError::TooManyBuckets { buckets: 2, limit: 1 })),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::from(GovernanceError::Cancelled), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NetworkUnavailable(Network::Devnet), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{}", err);
        }
    }
}
