/// Blob CRUD endpoints under `/blobs`
use crate::{
    api::response::{PaginatedResponse, StatusResponse},
    context::AppContext,
    error::{BlobberError, BlobberResult},
    metrics,
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Build blob routes
///
/// Uploads are unbounded, so the default body limit is lifted here.
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/blobs", get(list_blobs))
        .route(
            "/blobs/",
            get(missing_key)
                .put(missing_key)
                .post(missing_key)
                .delete(missing_key),
        )
        .route(
            "/blobs/*key",
            get(get_blob)
                .put(put_blob)
                .post(put_blob)
                .delete(delete_blob),
        )
        .layer(DefaultBodyLimit::disable())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub prefix: String,
}

/// List every key under a prefix as a single page
async fn list_blobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListParams>,
) -> BlobberResult<Json<PaginatedResponse<String>>> {
    debug!(prefix = %params.prefix, "Listing blobs");

    let result = ctx.blob_store.list(&params.prefix).await;
    metrics::record_blob_operation(ctx.blob_store.provider(), "list", &result);

    Ok(Json(PaginatedResponse::single_page(result?)))
}

/// Serve the raw blob bytes
async fn get_blob(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> BlobberResult<Response> {
    require_key(&key)?;

    let result = ctx.blob_store.get(&key).await;
    metrics::record_blob_operation(ctx.blob_store.provider(), "get", &result);
    let data = result?;

    let content_type = requested_content_type(&headers)
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// Store the request body under `key`, replacing any previous value
async fn put_blob(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> BlobberResult<(StatusCode, Json<StatusResponse>)> {
    require_key(&key)?;

    let body = body.map_err(|e| {
        warn!(key = %key, "Failed to read request body: {}", e);
        BlobberError::BadRequest(format!("failed to read request body: {}", e))
    })?;
    let size = body.len();

    let result = ctx.blob_store.put(&key, body.to_vec()).await;
    metrics::record_blob_operation(ctx.blob_store.provider(), "put", &result);
    result?;

    info!(key = %key, size, "Blob stored");
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::ok(format!("Blob {} stored", key))),
    ))
}

/// Remove a blob; missing keys are reported, not ignored
async fn delete_blob(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> BlobberResult<Json<StatusResponse>> {
    require_key(&key)?;

    let result = ctx.blob_store.delete(&key).await;
    metrics::record_blob_operation(ctx.blob_store.provider(), "delete", &result);
    result?;

    info!(key = %key, "Blob deleted");
    Ok(Json(StatusResponse::ok(format!("Blob {} deleted", key))))
}

async fn missing_key() -> BlobberError {
    BlobberError::BadRequest("key is required".to_string())
}

fn require_key(key: &str) -> BlobberResult<()> {
    if key.is_empty() {
        return Err(BlobberError::BadRequest("key is required".to_string()));
    }
    Ok(())
}

/// `Accept` value to echo as `Content-Type`, if it names one concrete type
fn requested_content_type(headers: &HeaderMap) -> Option<HeaderValue> {
    let accept = headers.get(header::ACCEPT)?.to_str().ok()?.trim();

    if accept.is_empty() || accept.contains(',') || accept.contains('*') || !accept.contains('/') {
        return None;
    }

    HeaderValue::from_str(accept).ok()
}
