/// Health check endpoints for Kubernetes liveness and readiness probes
///
/// - `/healthz`: pings the blob store; 500 when the bucket is unreachable
/// - `/readyz`: answers as soon as the server accepts connections
use crate::{
    api::response::StatusResponse,
    context::AppContext,
    error::ErrorResponse,
    metrics,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::error;

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}

/// Liveness probe backed by a blob store ping
pub async fn healthz(State(ctx): State<AppContext>) -> Response {
    let result = ctx.blob_store.ping().await;
    metrics::record_blob_operation(ctx.blob_store.provider(), "ping", &result);

    if let Err(e) = result {
        error!(provider = %ctx.blob_store.provider(), "Health check failed: {}", e);
        let body = ErrorResponse {
            success: false,
            error: true,
            message: "Blob store is unreachable".to_string(),
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    Json(StatusResponse::ok("Health endpoint is working")).into_response()
}

/// Readiness probe
pub async fn readyz() -> Json<StatusResponse> {
    Json(StatusResponse::ok("Ready endpoint is working"))
}
