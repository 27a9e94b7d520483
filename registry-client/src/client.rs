//! HTTP client for Docker registries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode, header};
use http_body_util::BodyExt as _;
use hyperdriver::Body;
use hyperdriver::client::SharedClientService;
use registry_store::Registry;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tower::ServiceExt as _;

use crate::credential::Credential;
use crate::error::Error;
use crate::probe::{ProbeFailure, ProbeOutcome};
use crate::resolve::{Resolve, SystemResolver};
use crate::registry_url::RegistryUrl;

/// Default bound on a single registry call, including name resolution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Image config label naming the source repository of an image.
pub const SOURCE_LABEL: &str = "org.opencontainers.image.source";

/// Single-image manifest types, which carry a config blob.
const MANIFEST_TYPES: &str = concat!(
    "application/vnd.oci.image.manifest.v1+json, ",
    "application/vnd.docker.distribution.manifest.v2+json",
);

/// A client for probing and browsing Docker registries.
///
/// One client serves every registry: the connection pool is shared, and the
/// target and credential are chosen per call.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    transport: SharedClientService<Body, Body>,
    resolver: Arc<dyn Resolve>,
    timeout: Duration,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    /// Create a client which connects over TCP, with TLS for `https` registries.
    pub fn new() -> Self {
        let transport = hyperdriver::Client::build_tcp_http()
            .with_default_tls()
            .build_service();

        Self {
            transport,
            resolver: Arc::new(SystemResolver),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client over an arbitrary transport and resolver.
    pub fn with_transport<R>(transport: SharedClientService<Body, Body>, resolver: R) -> Self
    where
        R: Resolve,
    {
        Self {
            transport,
            resolver: Arc::new(resolver),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the bound applied to each registry call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that a registry is reachable, and accepts `credential` if given.
    ///
    /// Issues a single `GET <base>/v2/`. The outcome is final; nothing is
    /// retried.
    #[tracing::instrument(skip(self, url, credential), fields(url = %url))]
    pub async fn probe(&self, url: &RegistryUrl, credential: Option<&Credential>) -> ProbeOutcome {
        let outcome = match tokio::time::timeout(self.timeout, self.version_check(url, credential))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::OtherFailure(ProbeFailure::Timeout),
        };

        tracing::debug!(?outcome, "probed registry");
        outcome
    }

    async fn version_check(
        &self,
        url: &RegistryUrl,
        credential: Option<&Credential>,
    ) -> ProbeOutcome {
        if let Some(host) = url.domain() {
            if let Err(error) = self.resolver.resolve(host, url.port()).await {
                tracing::debug!(%host, %error, "registry host does not resolve");
                return ProbeOutcome::InvalidUrl;
            }
        }

        let uri = match url.endpoint("") {
            Ok(uri) => uri,
            Err(error) => {
                tracing::debug!(%error, "registry url is not a valid request uri");
                return ProbeOutcome::InvalidUrl;
            }
        };

        let request = match build_request(uri, credential, None) {
            Ok(request) => request,
            Err(error) => return ProbeOutcome::OtherFailure(error.into()),
        };

        match self.transport.clone().oneshot(request).await {
            Ok(response) => ProbeOutcome::from_status(response.status()),
            Err(error) => ProbeOutcome::OtherFailure(ProbeFailure::Transport(error)),
        }
    }

    /// List the repositories in a stored registry.
    #[tracing::instrument(skip(self, registry), fields(registry = registry.id))]
    pub async fn catalog(&self, registry: &Registry) -> Result<Vec<String>, Error> {
        let catalog: Catalog = self.get_json(registry, "_catalog").await?;
        Ok(catalog.repositories)
    }

    /// List the tags of one repository in a stored registry.
    #[tracing::instrument(skip(self, registry), fields(registry = registry.id))]
    pub async fn tags(&self, registry: &Registry, repository: &str) -> Result<Vec<String>, Error> {
        validate_repository(repository)?;

        let list: TagList = self
            .get_json(registry, &format!("{repository}/tags/list"))
            .await?;
        Ok(list.tags.unwrap_or_default())
    }

    /// Find the source repository of an image from its config labels.
    ///
    /// Reads the manifest of `reference`, then its config blob, and returns
    /// the `org.opencontainers.image.source` label. Images without a config
    /// blob (manifest lists) or without the label give `None`.
    #[tracing::instrument(skip(self, registry), fields(registry = registry.id))]
    pub async fn source_repository(
        &self,
        registry: &Registry,
        repository: &str,
        reference: &str,
    ) -> Result<Option<String>, Error> {
        validate_repository(repository)?;
        validate_reference(reference)?;

        let manifest: Manifest = self
            .get_json_as(
                registry,
                &format!("{repository}/manifests/{reference}"),
                Some(MANIFEST_TYPES),
            )
            .await?;
        let Some(config) = manifest.config else {
            tracing::debug!("manifest has no config blob");
            return Ok(None);
        };
        validate_reference(&config.digest)?;

        let blob: ImageConfig = self
            .get_json(registry, &format!("{repository}/blobs/{}", config.digest))
            .await?;
        Ok(blob
            .config
            .and_then(|config| config.labels)
            .and_then(|mut labels| labels.remove(SOURCE_LABEL)))
    }

    async fn get_json<T>(&self, registry: &Registry, endpoint: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.get_json_as(registry, endpoint, None).await
    }

    async fn get_json_as<T>(
        &self,
        registry: &Registry,
        endpoint: &str,
        accept: Option<&'static str>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = RegistryUrl::parse(&registry.url)?;
        let credential = registry.token.as_ref().map(Credential::basic).transpose()?;
        let request = build_request(url.endpoint(endpoint)?, credential.as_ref(), accept)?;

        let response = tokio::time::timeout(self.timeout, self.transport.clone().oneshot(request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Error::Transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        } else if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        } else if !status.is_success() {
            return Err(Error::UnexpectedStatus(status));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|error| Error::Body(error.into()))?
            .to_bytes();

        Ok(serde_json::from_slice(&body)?)
    }
}

fn build_request(
    uri: http::Uri,
    credential: Option<&Credential>,
    accept: Option<&'static str>,
) -> Result<http::Request<Body>, http::Error> {
    let mut builder = http::Request::builder().method(Method::GET).uri(uri);
    if let Some(credential) = credential {
        builder = builder.header(header::AUTHORIZATION, credential.header_value());
    }
    if let Some(accept) = accept {
        builder = builder.header(header::ACCEPT, accept);
    }
    builder.body(Body::empty())
}

/// Repository names are lowercase path components separated by `/`, each
/// starting with a letter or digit.
fn validate_repository(name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && name.split('/').all(|component| {
            component
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
                && component.bytes().all(|b| {
                    b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-')
                })
        });

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidRepository(name.to_owned()))
    }
}

/// A tag (`latest`, `1.25`) or a digest (`sha256:...`).
fn validate_reference(reference: &str) -> Result<(), Error> {
    let valid = reference.len() <= 128
        && reference
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        && reference
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b':' | b'+'));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidReference(reference.to_owned()))
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    config: Option<Descriptor>,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: String,
}

#[derive(Debug, Deserialize)]
struct ImageConfig {
    config: Option<ContainerConfig>,
}

#[derive(Debug, Deserialize)]
struct ContainerConfig {
    #[serde(rename = "Labels")]
    labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    repositories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    tags: Option<Vec<String>>,
}
