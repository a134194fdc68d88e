/// Configuration management for Blobber
use crate::error::{BlobberError, BlobberResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub authentication: AuthConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Supported object storage providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobProvider {
    S3,
    Gcp,
    Azure,
    Alicloud,
}

impl BlobProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobProvider::S3 => "s3",
            BlobProvider::Gcp => "gcp",
            BlobProvider::Azure => "azure",
            BlobProvider::Alicloud => "alicloud",
        }
    }
}

impl fmt::Display for BlobProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlobProvider {
    type Err = BlobberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(BlobProvider::S3),
            "gcp" | "gcs" => Ok(BlobProvider::Gcp),
            "azure" => Ok(BlobProvider::Azure),
            "alicloud" | "oss" => Ok(BlobProvider::Alicloud),
            other => Err(BlobberError::Config(format!(
                "unsupported blob provider: {}",
                other
            ))),
        }
    }
}

/// Per-provider backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    S3(S3Config),
    Gcp(GcpConfig),
    Azure(AzureConfig),
    Alicloud(AlicloudConfig),
}

impl BackendConfig {
    pub fn provider(&self) -> BlobProvider {
        match self {
            BackendConfig::S3(_) => BlobProvider::S3,
            BackendConfig::Gcp(_) => BlobProvider::Gcp,
            BackendConfig::Azure(_) => BlobProvider::Azure,
            BackendConfig::Alicloud(_) => BlobProvider::Alicloud,
        }
    }

    /// Bucket or container the adapter operates on
    pub fn bucket(&self) -> &str {
        match self {
            BackendConfig::S3(c) => &c.bucket,
            BackendConfig::Gcp(c) => &c.bucket,
            BackendConfig::Azure(c) => &c.container,
            BackendConfig::Alicloud(c) => &c.bucket,
        }
    }
}

/// S3-compatible storage (AWS, R2, MinIO...)
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    /// Falls back to the AWS default region chain when unset
    pub region: Option<String>,
    /// Custom endpoint, e.g. "http://localhost:9000"
    pub endpoint: Option<String>,
    pub use_path_style: bool,
    /// Explicit key pair; the AWS_* variables are used when both are unset
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("use_path_style", &self.use_path_style)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Google Cloud Storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GcpConfig {
    pub bucket: String,
    /// Service account JSON file; the key is read from the environment when unset
    pub credentials_path: Option<PathBuf>,
}

/// Azure Blob Storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Account endpoint, e.g. "https://<account>.blob.core.windows.net/"
    pub endpoint: String,
    pub container: String,
}

/// Alicloud Object Storage Service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlicloudConfig {
    pub bucket: String,
    pub region: String,
    /// Regional endpoint, e.g. "https://oss-cn-hangzhou.aliyuncs.com"
    pub endpoint: String,
}

/// Secret store backing API token validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStoreType {
    Env,
}

impl FromStr for AuthStoreType {
    type Err = BlobberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(AuthStoreType::Env),
            other => Err(BlobberError::Config(format!(
                "unknown auth store type: {}",
                other
            ))),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub store_type: AuthStoreType,
    /// Environment variable holding the expected API token
    pub api_token_env_var: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> BlobberResult<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> BlobberResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let hostname = var("BLOBBER_HOSTNAME").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("BLOBBER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| BlobberError::Config("Invalid port number".to_string()))?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let provider: BlobProvider = var("BLOBBER_PROVIDER")
            .ok_or_else(|| BlobberError::Config("BLOBBER_PROVIDER is required".to_string()))?
            .parse()?;

        let backend = match provider {
            BlobProvider::S3 => BackendConfig::S3(S3Config {
                bucket: var("BLOBBER_S3_BUCKET").unwrap_or_default(),
                region: var("BLOBBER_S3_REGION"),
                endpoint: var("BLOBBER_S3_ENDPOINT"),
                use_path_style: var("BLOBBER_S3_USE_PATH_STYLE")
                    .map(|v| parse_bool(&v))
                    .transpose()?
                    .unwrap_or(false),
                access_key_id: var("BLOBBER_S3_ACCESS_KEY_ID"),
                secret_access_key: var("BLOBBER_S3_SECRET_ACCESS_KEY"),
            }),
            BlobProvider::Gcp => BackendConfig::Gcp(GcpConfig {
                bucket: var("BLOBBER_GCP_BUCKET").unwrap_or_default(),
                credentials_path: var("BLOBBER_GCP_CREDENTIALS_PATH").map(PathBuf::from),
            }),
            BlobProvider::Azure => BackendConfig::Azure(AzureConfig {
                endpoint: var("BLOBBER_AZURE_ENDPOINT").unwrap_or_default(),
                container: var("BLOBBER_AZURE_CONTAINER").unwrap_or_default(),
            }),
            BlobProvider::Alicloud => BackendConfig::Alicloud(AlicloudConfig {
                bucket: var("BLOBBER_ALICLOUD_BUCKET").unwrap_or_default(),
                region: var("BLOBBER_ALICLOUD_REGION").unwrap_or_default(),
                endpoint: var("BLOBBER_ALICLOUD_ENDPOINT").unwrap_or_default(),
            }),
        };

        let store_type = var("BLOBBER_AUTH_STORE_TYPE")
            .unwrap_or_else(|| "env".to_string())
            .parse()?;
        let api_token_env_var =
            var("BLOBBER_API_TOKEN_ENV_VAR").unwrap_or_else(|| "BLOBBER_API_TOKEN".to_string());

        let level = var("BLOBBER_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let format = match var("BLOBBER_LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Json,
            Some(f) if f == "json" => LogFormat::Json,
            Some(f) if f == "pretty" || f == "text" => LogFormat::Pretty,
            Some(f) => {
                return Err(BlobberError::Config(format!("unknown log format: {}", f)));
            }
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            backend,
            authentication: AuthConfig {
                store_type,
                api_token_env_var,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> BlobberResult<()> {
        if self.service.hostname.is_empty() {
            return Err(BlobberError::Config("Hostname cannot be empty".to_string()));
        }

        if self.backend.bucket().trim().is_empty() {
            return Err(BlobberError::NoValidBucket);
        }

        match &self.backend {
            BackendConfig::Azure(c) if c.endpoint.trim().is_empty() => {
                return Err(BlobberError::Config(
                    "Azure endpoint is required".to_string(),
                ));
            }
            BackendConfig::Alicloud(c) if c.endpoint.trim().is_empty() => {
                return Err(BlobberError::Config(
                    "Alicloud endpoint is required".to_string(),
                ));
            }
            _ => {}
        }

        if self.authentication.api_token_env_var.is_empty() {
            return Err(BlobberError::Config(
                "API token variable name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.hostname, self.service.port)
    }
}

fn parse_bool(value: &str) -> BlobberResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(BlobberError::Config(format!(
            "invalid boolean value: {}",
            other
        ))),
    }
}
