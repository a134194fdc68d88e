/// Alicloud OSS backend
///
/// OSS speaks the S3 dialect with virtual-hosted addressing, so the
/// client is the S3 builder pointed at `https://<bucket>.<endpoint host>`.
use crate::{
    blob_store::{remote::no_retries, remote::RemoteBlobStore, Credentials},
    config::{AlicloudConfig, BlobProvider},
    error::{BlobberError, BlobberResult},
};
use object_store::aws::AmazonS3Builder;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Virtual-hosted bucket URL for a regional endpoint
///
/// Accepts endpoints with or without a scheme; https is assumed when absent.
pub fn bucket_endpoint(endpoint: &str, bucket: &str) -> BlobberResult<String> {
    let endpoint = endpoint.trim();
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let url = Url::parse(&with_scheme).map_err(|e| {
        BlobberError::NoValidBlobClient(format!("invalid OSS endpoint '{}': {}", endpoint, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        BlobberError::NoValidBlobClient(format!("OSS endpoint '{}' has no host", endpoint))
    })?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}.{}:{}", url.scheme(), bucket, host, port),
        None => format!("{}://{}.{}", url.scheme(), bucket, host),
    })
}

/// Build the OSS client from an access key pair
pub fn connect(config: &AlicloudConfig, credentials: Credentials) -> BlobberResult<RemoteBlobStore> {
    info!(
        "Initializing Alicloud OSS blob storage (bucket: {}, region: {})",
        config.bucket, config.region
    );

    let (access_key_id, secret_access_key) = match credentials {
        Credentials::AccessKey {
            access_key_id,
            secret_access_key,
            ..
        } => (access_key_id, secret_access_key),
        other => {
            return Err(BlobberError::NoValidCredentials(format!(
                "OSS needs an access key, got {}",
                other.kind()
            )));
        }
    };

    if config.bucket.trim().is_empty() {
        return Err(BlobberError::NoValidBucket);
    }

    let endpoint = bucket_endpoint(&config.endpoint, &config.bucket)?;

    let store = AmazonS3Builder::new()
        .with_endpoint(endpoint)
        .with_region(&config.region)
        .with_bucket_name(&config.bucket)
        .with_access_key_id(access_key_id)
        .with_secret_access_key(secret_access_key)
        .with_virtual_hosted_style_request(true)
        .with_retry(no_retries())
        .build()
        .map_err(|e| BlobberError::NoValidBlobClient(format!("OSS client: {}", e)))?;

    RemoteBlobStore::new(Arc::new(store), &config.bucket, BlobProvider::Alicloud)
}
