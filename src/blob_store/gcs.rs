/// Google Cloud Storage backend
use crate::{
    blob_store::{remote::no_retries, remote::RemoteBlobStore, Credentials},
    config::{BlobProvider, GcpConfig},
    error::{BlobberError, BlobberResult},
};
use object_store::gcp::GoogleCloudStorageBuilder;
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Downloads are abandoned after this long
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the GCS client from a service account key
pub fn connect(config: &GcpConfig, credentials: Credentials) -> BlobberResult<RemoteBlobStore> {
    info!("Initializing GCS blob storage (bucket: {})", config.bucket);

    let json = match credentials {
        Credentials::ServiceAccount { json } => json,
        other => {
            return Err(BlobberError::NoValidCredentials(format!(
                "GCS needs a service account key, got {}",
                other.kind()
            )));
        }
    };

    if config.bucket.trim().is_empty() {
        return Err(BlobberError::NoValidBucket);
    }

    let store = GoogleCloudStorageBuilder::new()
        .with_bucket_name(&config.bucket)
        .with_service_account_key(json)
        .with_retry(no_retries())
        .build()
        .map_err(|e| BlobberError::NoValidBlobClient(format!("GCS client: {}", e)))?;

    Ok(RemoteBlobStore::new(Arc::new(store), &config.bucket, BlobProvider::Gcp)?
        .with_read_timeout(READ_TIMEOUT))
}
