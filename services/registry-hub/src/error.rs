//! Error types for the hub

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use registry_client::ProbeFailure;
use registry_store::StoreError;

/// Result type for hub handlers
pub type HubResult<T> = Result<T, HubError>;

/// Failures which are not reported in the response envelope.
///
/// These become a bare HTTP error status. The detail is only logged.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The registry file could not be written
    #[error("persisting registry: {0}")]
    Store(#[from] StoreError),

    /// The validation probe failed for a reason the caller cannot fix
    #[error("probing registry: {0}")]
    Probe(#[from] ProbeFailure),

    /// A browse call to a stored registry failed
    #[error("querying registry: {0}")]
    Upstream(#[from] registry_client::Error),
}

impl HubError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            HubError::Probe(ProbeFailure::UnexpectedStatus(_))
            | HubError::Upstream(registry_client::Error::UnexpectedStatus(_)) => {
                StatusCode::BAD_GATEWAY
            }
            HubError::Store(_) | HubError::Probe(_) | HubError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(error = %self, %status, "request failed");
        status.into_response()
    }
}
