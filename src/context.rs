/// Application context and dependency injection
use crate::{
    blob_store::{self, BlobStore},
    config::ServerConfig,
    error::BlobberResult,
    secret_store::{self, SecretStore},
};
use std::sync::Arc;
use tracing::info;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub blob_store: Arc<dyn BlobStore>,
    pub secret_store: Arc<dyn SecretStore>,
}

impl AppContext {
    /// Create a new application context from configuration
    ///
    /// Fails when the configuration is invalid or the blob store can't be built.
    pub async fn new(config: ServerConfig) -> BlobberResult<Self> {
        // Validate configuration
        config.validate()?;

        // Initialize blob store
        let blob_store = blob_store::connect(&config.backend).await?;

        // Initialize secret store
        let secret_store = secret_store::from_config(&config.authentication);

        info!("✓ Application context initialized");

        Ok(Self::from_parts(config, blob_store, secret_store))
    }

    /// Assemble a context from already-built services
    pub fn from_parts(
        config: ServerConfig,
        blob_store: Arc<dyn BlobStore>,
        secret_store: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            blob_store,
            secret_store,
        }
    }
}
