//! # Registry hub
//!
//! Backend for a Docker registry browser. The hub keeps a list of registry
//! endpoints in a JSON file and proxies calls to those registries.
//!
//! ## Routes
//!
//! | Route | Response |
//! |---|---|
//! | `GET /api/registry` | bare array of stored registries |
//! | `POST /api/registry` | validate a registry with a probe, then store it |
//! | `GET /api/registry/{id}` | one registry |
//! | `GET /api/images/{id}` | repositories in a registry |
//! | `GET /api/tags/{id}/{name}` | tags of a repository, highest first |
//! | `GET /api/image/{id}/{name}` | tags plus a `docker pull` command |
//!
//! Everything except the list is wrapped in an [`ApiResult`] envelope.
//! Anticipated failures keep HTTP status 200 and report the real status in
//! the envelope; unexpected ones are a bare 500 or 502. Other methods on
//! `/api/registry` answer 404.
//!
//! ## Example
//!
//! ```no_run
//! use registry_hub::HubBuilder;
//! use registry_store::RegistryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RegistryStore::open("registries.json").await?;
//! let hub = HubBuilder::new(store).build();
//!
//! // Serve the hub with axum or any tower-compatible server
//! # Ok(())
//! # }
//! ```

mod api;
mod browse;
#[cfg(feature = "cli")]
pub mod config;
mod envelope;
mod error;
mod registry;

pub use api::HubBuilder;
pub use browse::{Image, Tag};
pub use envelope::{ApiResult, Empty};
pub use error::{HubError, HubResult};
