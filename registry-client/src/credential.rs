//! Authorization credentials for registries.
//!
//! Callers hand the hub a full `Authorization` header value when they add a
//! registry. The header is forwarded untouched to the validation probe, but
//! only the token part (everything after the first space) is persisted.
//! Stored tokens are replayed to the registry as `Basic` credentials.

use std::fmt;

use http::HeaderValue;
use http::header::{InvalidHeaderValue, ToStrError};
use registry_store::Token;
use thiserror::Error;

/// An `Authorization` header value that could not be used as a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The header contains bytes that are not visible ASCII.
    #[error("authorization header is not visible ASCII")]
    NotAscii(#[from] ToStrError),

    /// A stored token cannot be placed in a header.
    #[error("token is not a valid header value")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// A credential in `"<scheme> <token>"` form.
#[derive(Clone)]
pub struct Credential {
    header: HeaderValue,
    scheme: String,
    token: Option<Token>,
}

impl Credential {
    /// Build a credential from an incoming `Authorization` header.
    pub fn from_header(value: &HeaderValue) -> Result<Self, CredentialError> {
        let text = value.to_str()?;
        let (scheme, token) = match text.split_once(' ') {
            Some((scheme, token)) if !token.is_empty() => (scheme, Some(Token::from(token))),
            Some((scheme, _)) => (scheme, None),
            None => (text, None),
        };

        let mut header = value.clone();
        header.set_sensitive(true);

        Ok(Self {
            scheme: scheme.to_owned(),
            token,
            header,
        })
    }

    /// Parse a credential from its textual header form.
    pub fn parse(value: &str) -> Result<Self, CredentialError> {
        Self::from_header(&HeaderValue::from_str(value)?)
    }

    /// Credential for a stored registry token.
    pub fn basic(token: &Token) -> Result<Self, CredentialError> {
        let mut header = HeaderValue::try_from(format!("Basic {}", token.revealed()))?;
        header.set_sensitive(true);

        Ok(Self {
            header,
            scheme: "Basic".to_owned(),
            token: Some(token.clone()),
        })
    }

    /// The authentication scheme, e.g. `Basic` or `Bearer`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The token portion of the credential, which is what gets stored.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Header value to send, marked sensitive.
    pub fn header_value(&self) -> HeaderValue {
        self.header.clone()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("token", &self.token)
            .finish()
    }
}
