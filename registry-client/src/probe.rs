//! Validation probe outcomes.

use http::StatusCode;
use thiserror::Error;

/// Result of probing a candidate registry.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The registry answered the version check with a success status.
    Reachable,

    /// The registry wants credentials, or rejected the ones sent.
    Unauthorized,

    /// The registry host name does not resolve.
    InvalidUrl,

    /// Anything else. A single failed probe is final.
    OtherFailure(ProbeFailure),
}

impl ProbeOutcome {
    /// Classify the status of the version check response.
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            ProbeOutcome::Reachable
        } else if status == StatusCode::UNAUTHORIZED {
            ProbeOutcome::Unauthorized
        } else {
            ProbeOutcome::OtherFailure(ProbeFailure::UnexpectedStatus(status))
        }
    }

    /// True if the registry can be stored.
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

/// Why a probe failed for a reason other than credentials or a bad host.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    /// The registry answered with neither success nor 401, e.g. a redirect.
    #[error("registry answered the version check with {0}")]
    UnexpectedStatus(StatusCode),

    /// Resolution and request did not finish within the probe timeout.
    #[error("registry probe timed out")]
    Timeout,

    /// The request could not be built.
    #[error("building probe request: {0}")]
    Request(#[from] http::Error),

    /// The request could not be sent, or the connection failed.
    #[error("sending probe request: {0}")]
    Transport(#[source] hyperdriver::client::Error),
}
