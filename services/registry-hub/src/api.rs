//! Hub builder and router

use axum::Router;
use registry_client::RegistryClient;
use registry_store::RegistryStore;

/// Shared state handed to every route
#[derive(Debug, Clone)]
pub(crate) struct Hub {
    pub(crate) store: RegistryStore,
    pub(crate) client: RegistryClient,
}

/// Builder for the hub's HTTP service
#[derive(Debug)]
pub struct HubBuilder {
    store: RegistryStore,
    client: Option<RegistryClient>,
}

impl HubBuilder {
    /// Create a new hub builder around a registry store
    pub fn new(store: RegistryStore) -> Self {
        Self {
            store,
            client: None,
        }
    }

    /// Set the client used to reach registries
    pub fn client(mut self, client: RegistryClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the hub service
    ///
    /// Returns a Router that can be served with any tower-compatible server
    pub fn build(self) -> Router {
        let hub = Hub {
            store: self.store,
            client: self.client.unwrap_or_default(),
        };

        Router::new()
            .merge(crate::registry::router())
            .merge(crate::browse::router())
            .with_state(hub)
    }
}
