//! Upload and streaming routes for the `images` and `videos` buckets,
//! plus thumbnail extraction.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{DefaultBodyLimit, OriginalUri, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mohtaref_axum::cache::is_admin_request;
use mohtaref_axum::{read_file_field, CachePolicy, RestParams, SiteAxumError};
use mohtaref_blob::{bytes_stream, BlobAdapter, BlobPut, Bucket};
use mohtaref_core::ServiceHandle;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::blob_errors::blob_error;
use crate::media_url::{media_url, MediaKind};
use crate::models::Video;
use crate::services::videos::videos_shared::THUMBNAIL;
use crate::services::SiteParams;

/// Room for multipart framing on top of the largest accepted payload.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct MediaState {
    pub blobs: BlobAdapter,
    pub videos: Arc<ServiceHandle<Video, SiteParams>>,
}

fn body_limit(blobs: &BlobAdapter, bucket: Bucket) -> Result<usize> {
    let max = blobs.config().max_bytes(bucket);
    max.checked_add(MULTIPART_OVERHEAD)
        .and_then(|limit| usize::try_from(limit).ok())
        .with_context(|| format!("{} upload limit of {max} bytes is too large", bucket.name()))
}

pub fn media_router(state: MediaState) -> Result<Router<()>> {
    let image_limit = body_limit(&state.blobs, Bucket::Images)?;
    let video_limit = body_limit(&state.blobs, Bucket::Videos)?;

    let stream_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/api/upload", post(upload_image).layer(DefaultBodyLimit::max(image_limit)))
        .route("/api/videos/upload", post(upload_video).layer(DefaultBodyLimit::max(video_limit)))
        .route("/api/images/{id}", get(serve_image))
        .route("/api/videos/stream/{id}", get(stream_video).route_layer(stream_cors))
        .route("/api/videos/{id}/thumbnail", post(generate_thumbnail))
        .with_state(state);

    Ok(router)
}

async fn upload_image(
    State(state): State<MediaState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, SiteAxumError> {
    upload(&state.blobs, Bucket::Images, MediaKind::Image, multipart).await
}

async fn upload_video(
    State(state): State<MediaState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, SiteAxumError> {
    upload(&state.blobs, Bucket::Videos, MediaKind::Video, multipart).await
}

/// Read the `file` part and store it. The bucket's allow-list runs before
/// any byte reaches the store.
async fn upload(
    blobs: &BlobAdapter,
    bucket: Bucket,
    kind: MediaKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, SiteAxumError> {
    let file = read_file_field(multipart, "file").await?;
    let size = file.size();

    let mut put = BlobPut::new().with_size_hint(size);
    if let Some(ct) = &file.content_type {
        put = put.with_content_type(ct.clone());
    }
    if let Some(name) = &file.filename {
        put = put.with_filename(name.clone());
    }

    let receipt = blobs
        .put(bucket, put, bytes_stream(file.bytes))
        .await
        .map_err(|e| blob_error(e, "File not found"))?;
    let file_id = receipt.id.to_string();

    Ok(Json(json!({
        "success": true,
        "fileId": file_id,
        "filename": receipt.filename,
        "contentType": receipt.content_type,
        "url": media_url(&file_id, kind),
    })))
}

async fn serve_image(
    State(state): State<MediaState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Response, SiteAxumError> {
    let admin = is_admin_request(uri.path(), &headers);
    serve(&state.blobs, Bucket::Images, &id, admin, "Image not found").await
}

async fn stream_video(
    State(state): State<MediaState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Response, SiteAxumError> {
    let admin = is_admin_request(uri.path(), &headers);
    let mut res = serve(&state.blobs, Bucket::Videos, &id, admin, "Video not found").await?;
    // whole payload only; ranges are not served
    res.headers_mut()
        .insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    Ok(res)
}

async fn serve(
    blobs: &BlobAdapter,
    bucket: Bucket,
    id: &str,
    admin: bool,
    missing: &str,
) -> Result<Response, SiteAxumError> {
    let opened = blobs
        .open(bucket, id)
        .await
        .map_err(|e| blob_error(e, missing))?;

    let content_type = HeaderValue::from_str(&opened.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let size = opened.size();

    let mut res = Body::from(opened.bytes).into_response();
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(header::CACHE_CONTROL, CachePolicy::Media.header_value(admin));
    Ok(res)
}

async fn generate_thumbnail(
    State(state): State<MediaState>,
    headers: HeaderMap,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<Value>, SiteAxumError> {
    let params = RestParams::from_parts("rest", &headers, query, method.as_str(), &uri);
    let res = state.videos.custom(THUMBNAIL, Some(&id), None, params).await?;
    Ok(Json(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mohtaref_blob::{BlobConfig, MemoryBlobStore};

    #[test]
    fn body_limits_leave_room_for_multipart_framing() {
        let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::new().with_max_image_bytes(2048));
        assert_eq!(body_limit(&blobs, Bucket::Images).unwrap(), 2048 + 1024 * 1024);
    }

    #[test]
    fn unrepresentable_body_limits_are_errors() {
        let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::new().with_max_video_bytes(u64::MAX));
        let err = body_limit(&blobs, Bucket::Videos).unwrap_err();
        assert!(err.to_string().contains("videos"));
    }
}
