/// API routes and handlers
pub mod blob;
pub mod health;
pub mod middleware;
pub mod response;

use crate::{context::AppContext, metrics};
use axum::{extract::State, middleware::from_fn_with_state, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Build API routes
///
/// Everything under `/blobs` requires an API token; health checks, service info
/// and metrics stay public.
pub fn routes(ctx: AppContext) -> Router<AppContext> {
    let protected = blob::routes()
        .route_layer(from_fn_with_state(ctx, middleware::require_api_token));

    Router::new()
        .route("/", get(service_info))
        .route("/metrics", get(metrics::metrics_handler))
        .merge(health::routes())
        .merge(protected)
}

/// Service description served at `/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub blob_provider: String,
}

async fn service_info(State(ctx): State<AppContext>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Blobber".to_string(),
        version: ctx.config.service.version.clone(),
        blob_provider: ctx.blob_store.provider().to_string(),
    })
}
