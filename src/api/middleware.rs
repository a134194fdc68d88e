/// Authentication and CORS middleware
use crate::{
    context::AppContext,
    error::BlobberError,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

/// Header carrying the shared API token
pub const API_TOKEN_HEADER: &str = "x-api-token";

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str =
    "Origin, X-Requested-With, Content-Type, Accept, Authorization, X-API-Token";
const MAX_AGE: &str = "86400";

/// Extract the API token header, if present and readable
pub fn extract_api_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// Require a valid `X-API-Token` before the request reaches a handler
pub async fn require_api_token(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Result<Response, BlobberError> {
    let token = extract_api_token(req.headers()).ok_or_else(|| {
        debug!(path = %req.uri().path(), "Request without API token");
        BlobberError::Unauthorized("missing API token".to_string())
    })?;

    let validation = ctx.secret_store.validate_token(token).await;

    match validation {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => {
            warn!(path = %req.uri().path(), "Rejected invalid API token");
            Err(BlobberError::Unauthorized("invalid API token".to_string()))
        }
        Err(e) => {
            error!("Failed to validate API token: {}", e);
            Err(e)
        }
    }
}

/// Attach CORS headers to every response; answer OPTIONS directly
///
/// Preflights short-circuit with 204 and an empty body, before auth runs.
pub async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_token(&headers), None);

        headers.insert("X-API-Token", HeaderValue::from_static("abc"));
        assert_eq!(extract_api_token(&headers), Some("abc"));
    }

    #[test]
    fn test_empty_api_token_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Token", HeaderValue::from_static(""));
        assert_eq!(extract_api_token(&headers), None);
    }
}
