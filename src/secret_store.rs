/// API token validation against a secret source
use crate::{
    config::{AuthConfig, AuthStoreType},
    error::{BlobberError, BlobberResult},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Source of the expected API token
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(false)` on mismatch, `Err` when the secret can't be checked at all
    async fn validate_token(&self, token: &str) -> BlobberResult<bool>;
}

/// Token held in an environment variable
///
/// The variable is read on every call, so rotating it takes effect
/// without a restart.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    var: String,
}

impl EnvSecretStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn validate_token(&self, token: &str) -> BlobberResult<bool> {
        let expected = match std::env::var(&self.var) {
            Ok(value) if !value.is_empty() => value,
            _ => {
                warn!(var = %self.var, "API token variable is not set");
                return Err(BlobberError::Internal(format!(
                    "API token variable {} is not set",
                    self.var
                )));
            }
        };

        Ok(constant_time_eq(token.as_bytes(), expected.as_bytes()))
    }
}

/// Build the secret store named by the auth configuration
pub fn from_config(config: &AuthConfig) -> Arc<dyn SecretStore> {
    match config.store_type {
        AuthStoreType::Env => {
            info!(var = %config.api_token_env_var, "Using environment secret store");
            Arc::new(EnvSecretStore::new(&config.api_token_env_var))
        }
    }
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"tokem"));
        assert!(!constant_time_eq(b"token", b"token2"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_env_store_validates_token() {
        std::env::set_var("BLOBBER_TEST_SECRET_MATCH", "s3cr3t");
        let store = EnvSecretStore::new("BLOBBER_TEST_SECRET_MATCH");

        assert!(store.validate_token("s3cr3t").await.unwrap());
        assert!(!store.validate_token("wrong").await.unwrap());
        assert!(!store.validate_token("").await.unwrap());
    }

    #[tokio::test]
    async fn test_env_store_rereads_variable() {
        let store = EnvSecretStore::new("BLOBBER_TEST_SECRET_ROTATE");

        std::env::set_var("BLOBBER_TEST_SECRET_ROTATE", "first");
        assert!(store.validate_token("first").await.unwrap());

        std::env::set_var("BLOBBER_TEST_SECRET_ROTATE", "second");
        assert!(!store.validate_token("first").await.unwrap());
        assert!(store.validate_token("second").await.unwrap());
    }

    #[tokio::test]
    async fn test_env_store_unset_variable_is_error() {
        std::env::remove_var("BLOBBER_TEST_SECRET_UNSET");
        let store = EnvSecretStore::new("BLOBBER_TEST_SECRET_UNSET");

        assert!(matches!(
            store.validate_token("anything").await,
            Err(BlobberError::Internal(_))
        ));
    }
}
