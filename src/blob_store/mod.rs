/// Blob Storage System
///
/// One contract over several remote object stores. Every adapter reports
/// a missing object through `BlobberError::NotFound`, so callers never need
/// to know which provider is active.

pub mod alicloud;
pub mod azure;
pub mod credentials;
pub mod gcs;
pub mod remote;
pub mod s3;

pub use credentials::{resolver_for, CredentialResolver, Credentials};

use crate::{
    config::{BackendConfig, BlobProvider},
    error::BlobberResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Blob storage backend trait
///
/// Implementations are long-lived and shared across concurrent requests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Check that the configured bucket/container is reachable
    async fn ping(&self) -> BlobberResult<()>;

    /// Check that a blob exists without downloading it
    async fn has(&self, key: &str) -> BlobberResult<()>;

    /// Retrieve a blob, fully read into memory
    async fn get(&self, key: &str) -> BlobberResult<Vec<u8>>;

    /// Store a blob, overwriting any previous value
    async fn put(&self, key: &str, data: Vec<u8>) -> BlobberResult<()>;

    /// Delete a blob
    async fn delete(&self, key: &str) -> BlobberResult<()>;

    /// List every key starting with `prefix`
    async fn list(&self, prefix: &str) -> BlobberResult<Vec<String>>;

    /// Provider behind this store
    fn provider(&self) -> BlobProvider;

    /// Bucket or container this store addresses
    fn bucket(&self) -> &str;
}

/// Resolve credentials and build the adapter for the configured provider
///
/// Any failure here is fatal to startup.
pub async fn connect(config: &BackendConfig) -> BlobberResult<Arc<dyn BlobStore>> {
    let resolver = resolver_for(config);
    info!(
        provider = %config.provider(),
        source = %resolver.source(),
        "Resolving blob storage credentials"
    );
    let credentials = resolver.resolve()?;

    let store: Arc<dyn BlobStore> = match config {
        BackendConfig::S3(c) => Arc::new(s3::S3BlobStore::connect(c, credentials).await?),
        BackendConfig::Gcp(c) => Arc::new(gcs::connect(c, credentials)?),
        BackendConfig::Azure(c) => Arc::new(azure::connect(c, credentials)?),
        BackendConfig::Alicloud(c) => Arc::new(alicloud::connect(c, credentials)?),
    };

    info!(
        provider = %store.provider(),
        bucket = %store.bucket(),
        "✓ Blob storage initialized"
    );

    Ok(store)
}
