/// Unified error types for Blobber
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed provider error kept as the source of a backend failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for Blobber
#[derive(Error, Debug)]
pub enum BlobberError {
    /// Object absent, whichever backend is active
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Required credentials could not be resolved
    #[error("no valid credentials provided: {0}")]
    NoValidCredentials(String),

    /// Adapter built without a bucket or container name
    #[error("no valid bucket provided")]
    NoValidBucket,

    /// Provider client could not be built
    #[error("no valid blob client provided: {0}")]
    NoValidBlobClient(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or rejected API token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed request (missing key, unreadable body)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Provider or transport failure for a single operation
    #[error("{operation} failed for '{key}': {source}")]
    Backend {
        operation: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BlobberError {
    /// Wrap a provider error with the operation and key it belongs to
    pub fn backend(
        operation: &'static str,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        BlobberError::Backend {
            operation,
            key: key.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobberError::NotFound(_))
    }

    /// HTTP status this error surfaces as
    pub fn status_code(&self) -> StatusCode {
        match self {
            BlobberError::NotFound(_) => StatusCode::NOT_FOUND,
            BlobberError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BlobberError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BlobberError::NoValidCredentials(_)
            | BlobberError::NoValidBucket
            | BlobberError::NoValidBlobClient(_)
            | BlobberError::Config(_)
            | BlobberError::Backend { .. }
            | BlobberError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: bool,
    pub message: String,
}

/// Convert BlobberError to HTTP response
impl IntoResponse for BlobberError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            BlobberError::NotFound(_)
            | BlobberError::Unauthorized(_)
            | BlobberError::BadRequest(_) => self.to_string(),
            BlobberError::Backend { operation, .. } => {
                format!("storage backend error during {}", operation)
            }
            _ => "Internal server error".to_string(), // Don't leak details
        };

        let body = Json(ErrorResponse {
            success: false,
            error: true,
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for Blobber operations
pub type BlobberResult<T> = Result<T, BlobberError>;
