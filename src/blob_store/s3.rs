/// S3-compatible blob storage backend
use crate::{
    blob_store::{BlobStore, Credentials},
    config::{BlobProvider, S3Config},
    error::{BlobberError, BlobberResult},
};
use async_trait::async_trait;
use aws_config::{retry::RetryConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials as AwsCredentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

/// S3 blob storage backend
///
/// Supports AWS S3 and S3-compatible storage providers (R2, MinIO, DigitalOcean Spaces, etc.)
#[derive(Clone)]
pub struct S3BlobStore {
    client: Arc<Client>,
    bucket: String,
}

impl S3BlobStore {
    /// Wrap an existing client; fails closed on an empty bucket name
    pub fn new(bucket: impl Into<String>, client: Client) -> BlobberResult<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(BlobberError::NoValidBucket);
        }

        Ok(Self {
            client: Arc::new(client),
            bucket,
        })
    }

    /// Build the client from resolved credentials and wrap it
    pub async fn connect(config: &S3Config, credentials: Credentials) -> BlobberResult<Self> {
        info!(
            "Initializing S3 blob storage (bucket: {}, region: {})",
            config.bucket,
            config.region.as_deref().unwrap_or("<default>")
        );

        let client = build_client(config, credentials).await?;
        Self::new(config.bucket.clone(), client)
    }

    fn log_failure(&self, operation: &str, key: &str, err: &dyn std::fmt::Display) {
        error!(bucket = %self.bucket, key, operation, error = %err, "S3 operation failed");
    }
}

/// Build an S3 client with endpoint, region and path-style overrides
pub async fn build_client(config: &S3Config, credentials: Credentials) -> BlobberResult<Client> {
    let (access_key_id, secret_access_key, session_token) = match credentials {
        Credentials::AccessKey {
            access_key_id,
            secret_access_key,
            session_token,
        } => (access_key_id, secret_access_key, session_token),
        other => {
            return Err(BlobberError::NoValidCredentials(format!(
                "S3 needs an access key, got {}",
                other.kind()
            )));
        }
    };

    let credentials = AwsCredentials::new(
        access_key_id,
        secret_access_key,
        session_token,
        None, // expiration
        "blobber-env",
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(credentials)
        .retry_config(RetryConfig::disabled());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    let aws_config = loader.load().await;

    let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

    if let Some(endpoint) = &config.endpoint {
        debug!("Using custom S3 endpoint: {}", endpoint);
        s3_config_builder = s3_config_builder.endpoint_url(endpoint);
    }

    if config.use_path_style {
        s3_config_builder = s3_config_builder.force_path_style(true);
    }

    Ok(Client::from_conf(s3_config_builder.build()))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ping(&self) -> BlobberResult<()> {
        debug!("Pinging S3 bucket: {}", self.bucket);

        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let e = e.into_service_error();
                if e.is_not_found() {
                    error!("S3 bucket not found: {}", self.bucket);
                    return Err(BlobberError::NotFound(self.bucket.clone()));
                }
                self.log_failure("ping", &self.bucket, &e);
                Err(BlobberError::backend("ping", &self.bucket, e))
            }
        }
    }

    async fn has(&self, key: &str) -> BlobberResult<()> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                // HEAD responses carry no body, so a bare 404 is all some providers send
                let status = e.raw_response().map(|r| r.status().as_u16());
                let e = e.into_service_error();
                if e.is_not_found() || status == Some(404) {
                    debug!("Blob not found in S3: {}", key);
                    return Err(BlobberError::NotFound(key.to_string()));
                }
                self.log_failure("has", key, &e);
                Err(BlobberError::backend("has", key, e))
            }
        }
    }

    async fn get(&self, key: &str) -> BlobberResult<Vec<u8>> {
        debug!("Downloading blob from S3: {}", key);

        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let status = e.raw_response().map(|r| r.status().as_u16());
                let e = e.into_service_error();
                if e.is_no_such_key() || status == Some(404) {
                    debug!("Blob not found in S3: {}", key);
                    return Err(BlobberError::NotFound(key.to_string()));
                }
                self.log_failure("get", key, &e);
                return Err(BlobberError::backend("get", key, e));
            }
        };

        // collect() consumes the body stream on every path
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| {
                self.log_failure("get", key, &e);
                BlobberError::backend("get", key, e)
            })?
            .into_bytes()
            .to_vec();

        debug!("✓ Blob downloaded from S3: {} ({} bytes)", key, data.len());
        Ok(data)
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> BlobberResult<()> {
        debug!("Uploading blob to S3: {} ({} bytes)", key, data.len());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                self.log_failure("put", key, &e);
                BlobberError::backend("put", key, e)
            })?;

        debug!("✓ Blob uploaded to S3: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> BlobberResult<()> {
        // DeleteObject succeeds for missing keys, so check existence first
        self.has(key).await?;

        debug!("Deleting blob from S3: {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                self.log_failure("delete", key, &e);
                BlobberError::backend("delete", key, e)
            })?;

        debug!("✓ Blob deleted from S3: {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> BlobberResult<Vec<String>> {
        debug!("Listing S3 blobs with prefix: {}", prefix);

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                let e = e.into_service_error();
                self.log_failure("list", prefix, &e);
                BlobberError::backend("list", prefix, e)
            })?;

            keys.extend(page.contents().iter().filter_map(|obj| obj.key().map(String::from)));
        }

        Ok(keys)
    }

    fn provider(&self) -> BlobProvider {
        BlobProvider::S3
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
