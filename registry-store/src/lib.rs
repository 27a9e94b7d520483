//! # Registry store
//!
//! Durable persistence for the list of known Docker registries.
//!
//! The list lives in a single pretty-printed JSON document:
//!
//! ```json
//! {
//!   "lastId": 2,
//!   "list": [
//!     { "id": 1, "name": "local", "url": "http://localhost:5000" },
//!     { "id": 2, "name": "private", "url": "https://registry.example", "token": "dXNlcjpwYXNz" }
//!   ]
//! }
//! ```
//!
//! [`RegistryStore`] owns that file. All writes go through a single lock, so
//! identifiers are handed out exactly once even when requests race, and every
//! write replaces the file atomically.
//!
//! ## Example
//!
//! ```no_run
//! use registry_store::{NewRegistry, RegistryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RegistryStore::open("registries.json").await?;
//! let registry = store
//!     .append(NewRegistry::new("local", "http://localhost:5000"))
//!     .await?;
//! assert_eq!(registry.id, store.load().await.last_id);
//! # Ok(())
//! # }
//! ```

mod error;
mod model;
mod store;
mod token;

pub use error::{StoreError, StoreResult};
pub use model::{NewRegistry, Registry, RegistryFile};
pub use store::RegistryStore;
pub use token::Token;
