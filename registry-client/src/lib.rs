//! # Registry client
//!
//! Talks to Docker-Registry-HTTP-API compatible endpoints on behalf of the hub.
//!
//! - [`RegistryClient::probe`] validates a candidate registry before it is
//!   stored: a single `GET <base>/v2/`, bounded by a timeout, classified into
//!   a [`ProbeOutcome`].
//! - [`RegistryClient::catalog`] and [`RegistryClient::tags`] browse a stored
//!   registry, replaying its token as `Basic` credentials.
//! - [`RegistryClient::source_repository`] reads an image's manifest and
//!   config blob to find the repository it was built from.
//!
//! ```no_run
//! use registry_client::{Credential, ProbeOutcome, RegistryClient, RegistryUrl};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistryClient::new();
//! let url = RegistryUrl::parse("http://localhost:5000")?;
//! let credential = Credential::parse("Basic dXNlcjpwYXNz")?;
//!
//! match client.probe(&url, Some(&credential)).await {
//!     ProbeOutcome::Reachable => println!("ok"),
//!     outcome => println!("rejected: {outcome:?}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod credential;
mod error;
pub mod mock;
mod probe;
mod registry_url;
mod resolve;

pub use self::client::{DEFAULT_TIMEOUT, RegistryClient, SOURCE_LABEL};
pub use self::credential::{Credential, CredentialError};
pub use self::error::Error;
pub use self::probe::{ProbeFailure, ProbeOutcome};
pub use self::registry_url::{ParseUrlError, RegistryUrl};
pub use self::resolve::{Resolve, SystemResolver};
