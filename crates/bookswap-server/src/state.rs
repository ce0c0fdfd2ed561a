//! Application state shared across handlers.

use std::sync::Arc;

use bookswap_exchange::Exchange;
use bookswap_store::Store;

use crate::config::ServerConfig;
use crate::events::ChannelRegistry;

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Database store.
    store: Store,
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// The assembled lifecycle engine.
    exchange: Exchange,
    /// Live channel registry for SSE delivery.
    registry: Arc<ChannelRegistry>,
}

impl AppState {
    /// Create new application state; wires the engine to the registry.
    pub fn new(store: Store, config: ServerConfig) -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        let push: Arc<dyn bookswap_exchange::LivePush> = registry.clone();
        let exchange = Exchange::new(store.clone(), push);

        Self {
            store,
            config: Arc::new(config),
            exchange,
            registry,
        }
    }

    /// Get a reference to the database store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a reference to the lifecycle engine.
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Get a reference to the live channel registry.
    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
