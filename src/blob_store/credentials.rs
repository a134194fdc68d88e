/// Credential resolution for blob storage providers
///
/// Each provider resolves its credentials exactly once at startup, from the
/// environment or a local file. There is no refresh: rotated credentials
/// need a restart.
use crate::{
    config::BackendConfig,
    error::{BlobberError, BlobberResult},
};
use std::{env, fmt, fs, path::PathBuf};

/// Provider credentials; exactly one variant per resolution
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Key pair for S3-compatible providers and Alicloud
    AccessKey {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },

    /// Raw service account JSON document for GCS
    ServiceAccount { json: String },

    /// Azure AD client secret
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::AccessKey { .. } => "access_key",
            Credentials::ServiceAccount { .. } => "service_account",
            Credentials::ClientSecret { .. } => "client_secret",
        }
    }
}

// Secrets never reach the logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessKey {
                access_key_id,
                session_token,
                ..
            } => f
                .debug_struct("AccessKey")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("session_token", &session_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Credentials::ServiceAccount { .. } => f
                .debug_struct("ServiceAccount")
                .field("json", &"<redacted>")
                .finish(),
            Credentials::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Strategy producing credentials from an external source
pub trait CredentialResolver: Send + Sync {
    /// Resolve credentials or fail with NoValidCredentials
    fn resolve(&self) -> BlobberResult<Credentials>;

    /// Short description of the source, for startup logs
    fn source(&self) -> String;
}

fn required_var(name: &str) -> BlobberResult<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(BlobberError::NoValidCredentials(format!(
            "environment variable {} is not set",
            name
        ))),
    }
}

/// Key pair read from environment variables
#[derive(Debug, Clone)]
pub struct EnvAccessKeyCredentials {
    pub access_key_id_var: String,
    pub secret_access_key_var: String,
    pub session_token_var: Option<String>,
}

impl EnvAccessKeyCredentials {
    pub fn aws() -> Self {
        Self {
            access_key_id_var: "AWS_ACCESS_KEY_ID".to_string(),
            secret_access_key_var: "AWS_SECRET_ACCESS_KEY".to_string(),
            session_token_var: Some("AWS_SESSION_TOKEN".to_string()),
        }
    }

    pub fn alicloud() -> Self {
        Self {
            access_key_id_var: "OSS_ACCESS_KEY_ID".to_string(),
            secret_access_key_var: "OSS_SECRET_ACCESS_KEY".to_string(),
            session_token_var: None,
        }
    }
}

impl CredentialResolver for EnvAccessKeyCredentials {
    fn resolve(&self) -> BlobberResult<Credentials> {
        let access_key_id = required_var(&self.access_key_id_var)?;
        let secret_access_key = required_var(&self.secret_access_key_var)?;
        let session_token = self
            .session_token_var
            .as_deref()
            .and_then(|name| env::var(name).ok())
            .filter(|token| !token.is_empty());

        Ok(Credentials::AccessKey {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }

    fn source(&self) -> String {
        format!("env:{}", self.access_key_id_var)
    }
}

/// Key pair given explicitly
#[derive(Clone)]
pub struct StaticAccessKeyCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl StaticAccessKeyCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }
}

impl CredentialResolver for StaticAccessKeyCredentials {
    fn resolve(&self) -> BlobberResult<Credentials> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(BlobberError::NoValidCredentials(
                "static access key is empty".to_string(),
            ));
        }

        Ok(Credentials::AccessKey {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
        })
    }

    fn source(&self) -> String {
        "static".to_string()
    }
}

/// Service account JSON document held in an environment variable
#[derive(Debug, Clone)]
pub struct EnvServiceAccountCredentials {
    pub var: String,
}

impl Default for EnvServiceAccountCredentials {
    fn default() -> Self {
        Self {
            var: "GOOGLE_SERVICE_ACCOUNT_KEY".to_string(),
        }
    }
}

impl CredentialResolver for EnvServiceAccountCredentials {
    fn resolve(&self) -> BlobberResult<Credentials> {
        Ok(Credentials::ServiceAccount {
            json: required_var(&self.var)?,
        })
    }

    fn source(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// Service account JSON document read from a local file
#[derive(Debug, Clone)]
pub struct JsonFileCredentials {
    pub path: PathBuf,
}

impl JsonFileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialResolver for JsonFileCredentials {
    fn resolve(&self) -> BlobberResult<Credentials> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            BlobberError::NoValidCredentials(format!(
                "cannot read credentials file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if json.trim().is_empty() {
            return Err(BlobberError::NoValidCredentials(format!(
                "credentials file {} is empty",
                self.path.display()
            )));
        }

        Ok(Credentials::ServiceAccount { json })
    }

    fn source(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Azure client secret read from environment variables
#[derive(Debug, Clone)]
pub struct EnvClientSecretCredentials {
    pub tenant_id_var: String,
    pub client_id_var: String,
    pub client_secret_var: String,
}

impl Default for EnvClientSecretCredentials {
    fn default() -> Self {
        Self {
            tenant_id_var: "AZURE_TENANT_ID".to_string(),
            client_id_var: "AZURE_CLIENT_ID".to_string(),
            client_secret_var: "AZURE_CLIENT_SECRET".to_string(),
        }
    }
}

impl CredentialResolver for EnvClientSecretCredentials {
    fn resolve(&self) -> BlobberResult<Credentials> {
        Ok(Credentials::ClientSecret {
            tenant_id: required_var(&self.tenant_id_var)?,
            client_id: required_var(&self.client_id_var)?,
            client_secret: required_var(&self.client_secret_var)?,
        })
    }

    fn source(&self) -> String {
        format!("env:{}", self.client_id_var)
    }
}

/// Pick the credential strategy for the configured backend
pub fn resolver_for(config: &BackendConfig) -> Box<dyn CredentialResolver> {
    match config {
        BackendConfig::S3(s3) => match (&s3.access_key_id, &s3.secret_access_key) {
            (None, None) => Box::new(EnvAccessKeyCredentials::aws()),
            // A half-configured pair resolves to an empty half and fails
            (id, secret) => Box::new(StaticAccessKeyCredentials::new(
                id.clone().unwrap_or_default(),
                secret.clone().unwrap_or_default(),
                None,
            )),
        },
        // object_store's GCS client has no API-key auth, only service
        // account keys, so there is no resolver for a GCP API key
        BackendConfig::Gcp(gcp) => match &gcp.credentials_path {
            Some(path) => Box::new(JsonFileCredentials::new(path.clone())),
            None => Box::new(EnvServiceAccountCredentials::default()),
        },
        BackendConfig::Azure(_) => Box::new(EnvClientSecretCredentials::default()),
        BackendConfig::Alicloud(_) => Box::new(EnvAccessKeyCredentials::alicloud()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GcpConfig, S3Config};
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Each test uses its own variable names so parallel tests don't collide

    #[test]
    fn test_env_access_key_resolves() {
        env::set_var("TEST_CREDS_A_KEY", "AKIA123");
        env::set_var("TEST_CREDS_A_SECRET", "s3cr3t");
        let resolver = EnvAccessKeyCredentials {
            access_key_id_var: "TEST_CREDS_A_KEY".to_string(),
            secret_access_key_var: "TEST_CREDS_A_SECRET".to_string(),
            session_token_var: Some("TEST_CREDS_A_TOKEN_UNSET".to_string()),
        };

        let creds = resolver.resolve().unwrap();
        assert_eq!(
            creds,
            Credentials::AccessKey {
                access_key_id: "AKIA123".to_string(),
                secret_access_key: "s3cr3t".to_string(),
                session_token: None,
            }
        );
    }

    #[test]
    fn test_env_access_key_missing_secret() {
        env::set_var("TEST_CREDS_B_KEY", "AKIA123");
        env::set_var("TEST_CREDS_B_SECRET", "");
        let resolver = EnvAccessKeyCredentials {
            access_key_id_var: "TEST_CREDS_B_KEY".to_string(),
            secret_access_key_var: "TEST_CREDS_B_SECRET".to_string(),
            session_token_var: None,
        };

        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, BlobberError::NoValidCredentials(_)));
    }

    #[test]
    fn test_env_client_secret_requires_all_vars() {
        env::set_var("TEST_CREDS_C_TENANT", "tenant");
        env::set_var("TEST_CREDS_C_CLIENT", "client");
        let resolver = EnvClientSecretCredentials {
            tenant_id_var: "TEST_CREDS_C_TENANT".to_string(),
            client_id_var: "TEST_CREDS_C_CLIENT".to_string(),
            client_secret_var: "TEST_CREDS_C_SECRET_UNSET".to_string(),
        };

        assert!(matches!(
            resolver.resolve(),
            Err(BlobberError::NoValidCredentials(_))
        ));

        env::set_var("TEST_CREDS_C_SECRET_UNSET", "secret");
        assert_eq!(resolver.resolve().unwrap().kind(), "client_secret");
    }

    #[test]
    fn test_json_file_credentials() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "service_account"}}"#).unwrap();

        let creds = JsonFileCredentials::new(file.path()).resolve().unwrap();
        assert_eq!(
            creds,
            Credentials::ServiceAccount {
                json: r#"{"type": "service_account"}"#.to_string()
            }
        );
    }

    #[test]
    fn test_json_file_missing_or_empty() {
        let missing = JsonFileCredentials::new("/nonexistent/blobber/creds.json");
        assert!(matches!(
            missing.resolve(),
            Err(BlobberError::NoValidCredentials(_))
        ));

        let empty = NamedTempFile::new().unwrap();
        assert!(matches!(
            JsonFileCredentials::new(empty.path()).resolve(),
            Err(BlobberError::NoValidCredentials(_))
        ));
    }

    #[test]
    fn test_static_credentials_reject_empty() {
        let resolver = StaticAccessKeyCredentials::new("", "secret", None);
        assert!(resolver.resolve().is_err());

        let resolver = StaticAccessKeyCredentials::new("id", "secret", Some("token".into()));
        assert!(resolver.resolve().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::AccessKey {
            access_key_id: "AKIA123".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: Some("session-secret".to_string()),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("AKIA123"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("session-secret"));

        let creds = Credentials::ServiceAccount {
            json: "{\"private_key\": \"pk\"}".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("private_key"));
    }

    #[test]
    fn test_resolver_selection() {
        let s3 = resolver_for(&BackendConfig::S3(S3Config::default()));
        assert_eq!(s3.source(), "env:AWS_ACCESS_KEY_ID");

        let gcp_file = resolver_for(&BackendConfig::Gcp(GcpConfig {
            bucket: "b".to_string(),
            credentials_path: Some(PathBuf::from("/etc/gcp.json")),
        }));
        assert_eq!(gcp_file.source(), "file:/etc/gcp.json");

        let gcp_env = resolver_for(&BackendConfig::Gcp(GcpConfig::default()));
        assert_eq!(gcp_env.source(), "env:GOOGLE_SERVICE_ACCOUNT_KEY");
    }

    #[test]
    fn test_configured_s3_keys_select_static_resolver() {
        let resolver = resolver_for(&BackendConfig::S3(S3Config {
            bucket: "b".to_string(),
            access_key_id: Some("AKIA123".to_string()),
            secret_access_key: Some("s3cr3t".to_string()),
            ..Default::default()
        }));
        assert_eq!(resolver.source(), "static");
        assert_eq!(
            resolver.resolve().unwrap(),
            Credentials::AccessKey {
                access_key_id: "AKIA123".to_string(),
                secret_access_key: "s3cr3t".to_string(),
                session_token: None,
            }
        );

        let half = resolver_for(&BackendConfig::S3(S3Config {
            access_key_id: Some("AKIA123".to_string()),
            ..Default::default()
        }));
        assert!(matches!(
            half.resolve(),
            Err(BlobberError::NoValidCredentials(_))
        ));
    }
}
