/// HTTP server setup and routing
use crate::{
    api::{self, middleware::cors},
    context::AppContext,
    error::{BlobberError, BlobberResult, ErrorResponse},
    metrics::track_metrics,
};
use axum::{http::StatusCode, middleware, response::Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .merge(api::routes(ctx.clone()))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        // Outermost so preflights never reach auth and every response gets the headers
        .layer(middleware::from_fn(cors))
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            success: false,
            error: true,
            message: "Endpoint not found".to_string(),
        }),
    )
}

/// 405 handler for known paths hit with an unrouted method
async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            success: false,
            error: true,
            message: "Method not allowed".to_string(),
        }),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> BlobberResult<()> {
    let addr = ctx.config.bind_address();

    info!("🚀 Blobber listening on {}", addr);
    info!("   Blob provider: {}", ctx.blob_store.provider());

    let app = build_router(ctx);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BlobberError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| BlobberError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blob_store::{remote::RemoteBlobStore, BlobStore},
        config::{
            AuthConfig, AuthStoreType, BackendConfig, BlobProvider, GcpConfig, LogFormat,
            LoggingConfig, ServerConfig, ServiceConfig,
        },
        secret_store::EnvSecretStore,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
        response::Response,
    };
    use object_store::memory::InMemory;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN_VAR: &str = "BLOBBER_TEST_ROUTER_TOKEN";
    const TOKEN: &str = "router-secret";

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 0,
                version: "test".to_string(),
            },
            backend: BackendConfig::Gcp(GcpConfig {
                bucket: "test-bucket".to_string(),
                credentials_path: None,
            }),
            authentication: AuthConfig {
                store_type: AuthStoreType::Env,
                api_token_env_var: TOKEN_VAR.to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    fn test_router() -> Router {
        std::env::set_var(TOKEN_VAR, TOKEN);
        router_with_token_var(TOKEN_VAR)
    }

    fn router_with_token_var(token_var: &str) -> Router {
        let store: Arc<dyn BlobStore> = Arc::new(
            RemoteBlobStore::new(Arc::new(InMemory::new()), "test-bucket", BlobProvider::Gcp)
                .unwrap(),
        );
        let ctx = AppContext::from_parts(test_config(), store, Arc::new(EnvSecretStore::new(token_var)));
        build_router(ctx)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-API-Token", token);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_blob_lifecycle() {
        let app = test_router();

        let put = send(
            &app,
            request(Method::PUT, "/blobs/a.json", Some(TOKEN), br#"{"x":1}"#.to_vec()),
        )
        .await;
        assert_eq!(put.status(), StatusCode::CREATED);
        assert_eq!(body_json(put).await["success"], json!(true));

        let get = send(&app, request(Method::GET, "/blobs/a.json", Some(TOKEN), vec![])).await;
        assert_eq!(get.status(), StatusCode::OK);
        assert_eq!(
            get.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(body_bytes(get).await, br#"{"x":1}"#.to_vec());

        let list = send(&app, request(Method::GET, "/blobs?prefix=a", Some(TOKEN), vec![])).await;
        assert_eq!(list.status(), StatusCode::OK);
        assert_eq!(
            body_json(list).await,
            json!({
                "items": ["a.json"],
                "pagination": {"page": 1, "page_size": 1, "total_items": 1, "total_pages": 1}
            })
        );

        let delete = send(&app, request(Method::DELETE, "/blobs/a.json", Some(TOKEN), vec![])).await;
        assert_eq!(delete.status(), StatusCode::OK);
        assert_eq!(body_json(delete).await["success"], json!(true));

        let get = send(&app, request(Method::GET, "/blobs/a.json", Some(TOKEN), vec![])).await;
        assert_eq!(get.status(), StatusCode::NOT_FOUND);
        let envelope: ErrorResponse = serde_json::from_slice(&body_bytes(get).await).unwrap();
        assert!(!envelope.success);
        assert!(envelope.error);

        let delete = send(&app, request(Method::DELETE, "/blobs/a.json", Some(TOKEN), vec![])).await;
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_keys_and_post() {
        let app = test_router();

        let post = send(
            &app,
            request(Method::POST, "/blobs/dir/sub/b.txt", Some(TOKEN), b"hello".to_vec()),
        )
        .await;
        assert_eq!(post.status(), StatusCode::CREATED);

        let get = Request::builder()
            .uri("/blobs/dir/sub/b.txt")
            .header("X-API-Token", TOKEN)
            .header(header::ACCEPT, "text/plain")
            .body(Body::empty())
            .unwrap();
        let get = send(&app, get).await;
        assert_eq!(get.status(), StatusCode::OK);
        assert_eq!(get.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_bytes(get).await, b"hello".to_vec());

        let list = send(&app, request(Method::GET, "/blobs?prefix=dir/", Some(TOKEN), vec![])).await;
        assert_eq!(body_json(list).await["items"], json!(["dir/sub/b.txt"]));
    }

    #[tokio::test]
    async fn test_list_without_prefix_is_empty_page() {
        let app = test_router();

        let list = send(&app, request(Method::GET, "/blobs", Some(TOKEN), vec![])).await;
        assert_eq!(list.status(), StatusCode::OK);
        assert_eq!(
            body_json(list).await,
            json!({
                "items": [],
                "pagination": {"page": 1, "page_size": 0, "total_items": 0, "total_pages": 1}
            })
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test_router();

        for uri in ["/blobs", "/blobs/a.json"] {
            let response = send(&app, request(Method::GET, uri, None, vec![])).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(response).await["success"], json!(false));
        }
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let app = test_router();

        let response = send(
            &app,
            request(Method::PUT, "/blobs/a.json", Some("nope"), b"x".to_vec()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preflight_skips_auth() {
        let app = test_router();

        let response = send(&app, request(Method::OPTIONS, "/blobs/anything", None, vec![])).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_cors_headers_on_errors() {
        let app = test_router();

        let response = send(&app, request(Method::GET, "/blobs/a.json", None, vec![])).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    }

    #[tokio::test]
    async fn test_empty_key_is_bad_request() {
        let app = test_router();

        let response = send(&app, request(Method::GET, "/blobs/", Some(TOKEN), vec![])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], json!(true));
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = test_router();

        let health = send(&app, request(Method::GET, "/healthz", None, vec![])).await;
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(
            body_json(health).await,
            json!({"success": true, "message": "Health endpoint is working"})
        );

        let ready = send(&app, request(Method::GET, "/readyz", None, vec![])).await;
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(
            body_json(ready).await["message"],
            json!("Ready endpoint is working")
        );
    }

    #[tokio::test]
    async fn test_service_info_and_metrics() {
        let app = test_router();

        let info = send(&app, request(Method::GET, "/", None, vec![])).await;
        assert_eq!(info.status(), StatusCode::OK);
        let info = body_json(info).await;
        assert_eq!(info["name"], json!("Blobber"));
        assert_eq!(info["blob_provider"], json!("gcp"));

        let metrics = send(&app, request(Method::GET, "/metrics", None, vec![])).await;
        assert_eq!(metrics.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(metrics).await).unwrap();
        assert!(text.contains("http_requests_total"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = test_router();

        let response = send(&app, request(Method::GET, "/nope", None, vec![])).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["success"], json!(false));
    }

    #[tokio::test]
    async fn test_unset_token_var_is_internal_error() {
        let token_var = "BLOBBER_TEST_ROUTER_TOKEN_UNSET";
        std::env::remove_var(token_var);
        let app = router_with_token_var(token_var);

        let response = send(&app, request(Method::GET, "/blobs/a.json", Some(TOKEN), vec![])).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let envelope: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(!envelope.success);
        assert!(envelope.error);
        assert_eq!(envelope.message, "Internal server error");
    }

    #[tokio::test]
    async fn test_unrouted_method_gets_error_envelope() {
        let app = test_router();

        for (method, uri) in [(Method::PUT, "/blobs"), (Method::PATCH, "/blobs/a.json")] {
            let response = send(&app, request(method, uri, Some(TOKEN), b"x".to_vec())).await;
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                body_json(response).await,
                json!({"success": false, "error": true, "message": "Method not allowed"})
            );
        }
    }
}
