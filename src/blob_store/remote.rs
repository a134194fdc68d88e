/// Blob store over an `object_store` client
///
/// Shared by the GCS, Azure and Alicloud adapters. Each of them builds its
/// own provider client and hands it over here; the not-found mapping,
/// listing and delete probing live in one place.
use crate::{
    blob_store::BlobStore,
    config::BlobProvider,
    error::{BlobberError, BlobberResult},
};
use async_trait::async_trait;
use futures::StreamExt;
use object_store::{path::Path, ObjectStore, PutPayload, RetryConfig};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error};

/// Client retry policy: failed calls surface immediately
pub fn no_retries() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        ..Default::default()
    }
}

/// Blob store backed by any `ObjectStore` implementation
pub struct RemoteBlobStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    provider: BlobProvider,
    read_timeout: Option<Duration>,
}

impl RemoteBlobStore {
    /// Wrap a provider client; fails closed on an empty bucket name
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        provider: BlobProvider,
    ) -> BlobberResult<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(BlobberError::NoValidBucket);
        }

        Ok(Self {
            store,
            bucket,
            provider,
            read_timeout: None,
        })
    }

    /// Abandon reads that take longer than `timeout`
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Object path holding exactly `key`, byte for byte
    ///
    /// Keys `object_store` would rewrite (leading or trailing `/`, empty
    /// segments, `.`/`..` segments, control characters) are rejected.
    fn object_path(key: &str) -> BlobberResult<Path> {
        if key.is_empty() {
            return Err(BlobberError::BadRequest("key is required".to_string()));
        }

        let path = Path::parse(key)
            .map_err(|e| BlobberError::BadRequest(format!("invalid key '{}': {}", key, e)))?;
        if path.as_ref() != key {
            return Err(BlobberError::BadRequest(format!(
                "invalid key '{}': leading or trailing '/'",
                key
            )));
        }

        Ok(path)
    }

    /// Map the provider's not-found signal to the shared error
    fn translate(&self, operation: &'static str, key: &str, err: object_store::Error) -> BlobberError {
        match err {
            object_store::Error::NotFound { .. } => {
                debug!(provider = %self.provider, key, operation, "Blob not found");
                BlobberError::NotFound(key.to_string())
            }
            other => {
                error!(
                    provider = %self.provider,
                    bucket = %self.bucket,
                    key,
                    operation,
                    error = %other,
                    "Blob operation failed"
                );
                BlobberError::backend(operation, key, other)
            }
        }
    }
}

/// Directory part of a string prefix, e.g. "logs/2024/ja" -> "logs/2024"
///
/// `object_store` lists by whole path segments, so listing starts at the
/// deepest complete directory and the rest is filtered by string prefix.
/// A directory that isn't a valid path lists from the bucket root.
fn listing_root(prefix: &str) -> Option<Path> {
    let dir = &prefix[..prefix.rfind('/')?];
    let path = Path::parse(dir).ok()?;
    (!dir.is_empty() && path.as_ref() == dir).then_some(path)
}

#[async_trait]
impl BlobStore for RemoteBlobStore {
    async fn ping(&self) -> BlobberResult<()> {
        debug!(provider = %self.provider, bucket = %self.bucket, "Pinging blob store");

        // One page is enough to prove the bucket exists and is readable
        let mut listing = self.store.list(None);
        match listing.next().await {
            None | Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(self.translate("ping", &self.bucket, e)),
        }
    }

    async fn has(&self, key: &str) -> BlobberResult<()> {
        let path = Self::object_path(key)?;

        self.store
            .head(&path)
            .await
            .map(|_| ())
            .map_err(|e| self.translate("has", key, e))
    }

    async fn get(&self, key: &str) -> BlobberResult<Vec<u8>> {
        let path = Self::object_path(key)?;
        debug!(provider = %self.provider, key, "Downloading blob");

        // The body stream is owned by this future and dropped with it
        let fetch = async { self.store.get(&path).await?.bytes().await };

        let result = match self.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch).await.map_err(|_| {
                error!(provider = %self.provider, key, ?timeout, "Blob download timed out");
                BlobberError::backend("get", key, format!("timed out after {:?}", timeout))
            })?,
            None => fetch.await,
        };

        let data = result.map_err(|e| self.translate("get", key, e))?;
        debug!(provider = %self.provider, key, size = data.len(), "✓ Blob downloaded");
        Ok(data.to_vec())
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> BlobberResult<()> {
        let path = Self::object_path(key)?;
        debug!(provider = %self.provider, key, size = data.len(), "Uploading blob");

        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map(|_| ())
            .map_err(|e| self.translate("put", key, e))
    }

    async fn delete(&self, key: &str) -> BlobberResult<()> {
        let path = Self::object_path(key)?;

        // Not every object store reports a missing object on delete
        self.has(key).await?;

        debug!(provider = %self.provider, key, "Deleting blob");
        self.store
            .delete(&path)
            .await
            .map_err(|e| self.translate("delete", key, e))
    }

    async fn list(&self, prefix: &str) -> BlobberResult<Vec<String>> {
        debug!(provider = %self.provider, prefix, "Listing blobs");

        let root = listing_root(prefix);
        let mut listing = self.store.list(root.as_ref());

        let mut keys = Vec::new();
        while let Some(meta) = listing.next().await {
            let meta = meta.map_err(|e| self.translate("list", prefix, e))?;
            let key = meta.location.to_string();
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    fn provider(&self) -> BlobProvider {
        self.provider
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
