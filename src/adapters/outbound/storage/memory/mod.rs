//! In-memory storage backend built on `object_store::memory::InMemory`

pub mod in_memory_client;

pub use in_memory_client::{InMemoryStorageClient, IN_MEMORY_ENDPOINT};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::{
    domain::{config::ServerConfig, errors::StorageResult},
    ports::storage::{ClientConnector, StorageClient},
};

/// Connector handing out in-memory clients.
///
/// By default every connection gets a fresh, empty store addressed by the
/// configured endpoint. [`InMemoryConnector::shared`] instead hands out the
/// same client each time, so several adapters can observe one store.
#[derive(Default)]
pub struct InMemoryConnector {
    shared: Option<Arc<InMemoryStorageClient>>,
    connections: AtomicUsize,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(client: Arc<InMemoryStorageClient>) -> Self {
        Self {
            shared: Some(client),
            connections: AtomicUsize::new(0),
        }
    }

    /// Number of clients this connector has produced
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientConnector for InMemoryConnector {
    async fn connect(&self, config: &ServerConfig) -> StorageResult<Arc<dyn StorageClient>> {
        let count = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
        info!(endpoint = config.endpoint(), connections = count, "Creating in-memory client");

        let client = match &self.shared {
            Some(client) => client.clone(),
            None => Arc::new(InMemoryStorageClient::with_endpoint_url(config.endpoint_url())),
        };

        Ok(client)
    }
}
