/// Azure Blob Storage backend
use crate::{
    blob_store::{remote::no_retries, remote::RemoteBlobStore, Credentials},
    config::{AzureConfig, BlobProvider},
    error::{BlobberError, BlobberResult},
};
use object_store::azure::MicrosoftAzureBuilder;
use std::sync::Arc;
use tracing::info;

/// Account endpoint without its trailing slash
pub fn account_endpoint(endpoint: &str) -> &str {
    endpoint.trim().trim_end_matches('/')
}

/// Build the Azure client from a service principal secret
pub fn connect(config: &AzureConfig, credentials: Credentials) -> BlobberResult<RemoteBlobStore> {
    let endpoint = account_endpoint(&config.endpoint);
    info!(
        "Initializing Azure blob storage (endpoint: {}, container: {})",
        endpoint, config.container
    );

    let (tenant_id, client_id, client_secret) = match credentials {
        Credentials::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => (tenant_id, client_id, client_secret),
        other => {
            return Err(BlobberError::NoValidCredentials(format!(
                "Azure needs a client secret, got {}",
                other.kind()
            )));
        }
    };

    if config.container.trim().is_empty() {
        return Err(BlobberError::NoValidBucket);
    }
    if endpoint.is_empty() {
        return Err(BlobberError::NoValidBlobClient(
            "Azure endpoint is empty".to_string(),
        ));
    }

    // The URL carries the account name; the container is set explicitly
    let store = MicrosoftAzureBuilder::new()
        .with_url(endpoint)
        .with_container_name(&config.container)
        .with_tenant_id(tenant_id)
        .with_client_id(client_id)
        .with_client_secret(client_secret)
        .with_retry(no_retries())
        .build()
        .map_err(|e| BlobberError::NoValidBlobClient(format!("Azure client: {}", e)))?;

    RemoteBlobStore::new(Arc::new(store), &config.container, BlobProvider::Azure)
}
