//! Registry base URLs.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use http::Uri;
use thiserror::Error;
use url::Url;

/// Errors that can occur when normalizing a registry URL.
#[derive(Debug, Error)]
pub enum ParseUrlError {
    /// No URL was given.
    #[error("empty registry url")]
    Empty,

    /// The URL could not be parsed.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Only `http` and `https` registries are supported.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL has no host.
    #[error("registry url has no host")]
    MissingHost,

    /// Credentials belong in the authorization header, not the URL.
    #[error("registry url must not contain credentials")]
    EmbeddedCredentials,

    /// A registry base URL cannot carry a query or fragment.
    #[error("registry url must not contain a query or fragment")]
    QueryOrFragment,

    /// The URL is valid, but could not be turned into a request URI.
    #[error("invalid URI: {0}")]
    Uri(#[from] http::uri::InvalidUri),
}

/// The normalized base URL of a Docker registry.
///
/// The base never ends in a slash and never includes the `/v2` API prefix,
/// so `http://registry.example:5000/v2/` and `registry.example:5000` (with
/// an `http://` scheme) normalize to the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUrl {
    url: Url,
}

impl RegistryUrl {
    /// Normalize user input into a registry base URL.
    ///
    /// Input without a scheme is assumed to be `https`.
    pub fn parse(input: &str) -> Result<Self, ParseUrlError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseUrlError::Empty);
        }

        let candidate = if input.contains("://") {
            Cow::Borrowed(input)
        } else {
            Cow::Owned(format!("https://{input}"))
        };

        let mut url = Url::parse(&candidate)?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ParseUrlError::UnsupportedScheme(other.to_owned())),
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ParseUrlError::MissingHost);
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(ParseUrlError::EmbeddedCredentials);
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ParseUrlError::QueryOrFragment);
        }

        let path = url.path().trim_end_matches('/');
        let path = path
            .strip_suffix("/v2")
            .unwrap_or(path)
            .trim_end_matches('/')
            .to_owned();
        url.set_path(&path);

        Ok(Self { url })
    }

    /// The base URL, without a trailing slash.
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// Root of the registry HTTP API, `<base>/v2`.
    pub fn api_root(&self) -> String {
        format!("{}/v2", self.base())
    }

    /// Build a request URI for an API endpoint below [`RegistryUrl::api_root`].
    ///
    /// An empty endpoint addresses the API version check, `<base>/v2/`.
    pub fn endpoint(&self, endpoint: &str) -> Result<Uri, ParseUrlError> {
        let uri = format!("{}/{}", self.api_root(), endpoint.trim_start_matches('/'));
        Ok(uri.parse::<Uri>()?)
    }

    /// The host name, if the registry is not addressed by IP.
    pub fn domain(&self) -> Option<&str> {
        self.url.domain()
    }

    /// The port, falling back to the scheme's default.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(443)
    }

    /// The registry reference used by `docker pull`: the base without its scheme.
    pub fn reference(&self) -> &str {
        let base = self.base();
        base.split_once("://").map_or(base, |(_, rest)| rest)
    }
}

impl fmt::Display for RegistryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base())
    }
}

impl FromStr for RegistryUrl {
    type Err = ParseUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
