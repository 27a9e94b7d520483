//! Error types for registry API calls

use http::StatusCode;
use thiserror::Error;

use crate::credential::CredentialError;
use crate::registry_url::ParseUrlError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error occured while querying a registry
#[derive(Debug, Error)]
pub enum Error {
    /// The stored registry URL is not usable
    #[error("invalid registry url: {0}")]
    Url(#[from] ParseUrlError),

    /// The stored credential is not usable
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The repository name is not a valid image name
    #[error("invalid repository name: {0}")]
    InvalidRepository(String),

    /// The tag or digest is not a valid manifest reference
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The registry rejected the credential
    #[error("registry requires valid credentials")]
    Unauthorized,

    /// The registry does not know the requested resource
    #[error("not found in registry")]
    NotFound,

    /// The registry answered with a status the hub does not handle
    #[error("unexpected registry response: {0}")]
    UnexpectedStatus(StatusCode),

    /// The registry did not answer in time
    #[error("registry request timed out")]
    Timeout,

    /// An error occured while building the request
    #[error("building request: {0}")]
    Request(#[from] http::Error),

    /// An error occured while sending the request
    #[error("sending request: {0}")]
    Transport(#[source] hyperdriver::client::Error),

    /// An error occured while recieving the response body
    #[error("reading response body: {0}")]
    Body(#[source] BoxError),

    /// The response body was not the expected JSON document
    #[error("decoding response body: {0}")]
    Decode(#[from] serde_json::Error),
}
