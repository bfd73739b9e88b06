//! # Cache control
//!
//! Public reads carry CDN-friendly headers and are memoized in a
//! process-level [`ResponseCache`]; admin reads are never cached. Writes
//! invalidate the affected paths through the same cache.
//!
//! Entries are keyed by path alone: no service reads the query string, so
//! `?anything` variants share one entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use dashmap::DashMap;

/// Header value for responses that must never be cached.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Largest JSON body kept in the response cache.
const MAX_CACHED_BODY: usize = 8 * 1024 * 1024;

/// Freshness class of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Projects and services: 10 minutes.
    Content,
    /// Images, videos, gallery and banners: 30 minutes.
    Media,
    /// Never publicly cached.
    Uncached,
}

impl CachePolicy {
    pub const CONTENT_SECS: u64 = 600;
    pub const MEDIA_SECS: u64 = 1800;

    pub fn max_age(&self) -> Option<u64> {
        match self {
            CachePolicy::Content => Some(Self::CONTENT_SECS),
            CachePolicy::Media => Some(Self::MEDIA_SECS),
            CachePolicy::Uncached => None,
        }
    }

    /// Cache-Control value for a read, given whether the caller is an admin.
    pub fn header_value(&self, admin: bool) -> HeaderValue {
        match (admin, self.max_age()) {
            (false, Some(secs)) => public_cache_control(secs),
            _ => HeaderValue::from_static(NO_STORE),
        }
    }
}

/// `public, s-maxage=D, stale-while-revalidate=2D`
pub fn public_cache_control(secs: u64) -> HeaderValue {
    let value = format!("public, s-maxage={secs}, stale-while-revalidate={}", secs * 2);
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(NO_STORE))
}

/// Read `s-maxage` back out of a Cache-Control value.
fn shared_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("s-maxage="))
        .and_then(|v| v.parse().ok())
}

/// A request is an admin request when its path or referer mentions
/// `/admin`, or it carries `x-admin-request: true`.
pub fn is_admin_request(path: &str, headers: &HeaderMap) -> bool {
    if path.contains("/admin") {
        return true;
    }

    let referer_is_admin = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(|r| r.contains("/admin"))
        .unwrap_or(false);

    let flagged = headers
        .get("x-admin-request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "true")
        .unwrap_or(false);

    referer_is_admin || flagged
}

#[derive(Debug, Clone)]
struct CachedResponse {
    content_type: Option<HeaderValue>,
    cache_control: HeaderValue,
    body: Bytes,
    expires_at: Instant,
}

/// Process-level cache of public GET responses keyed by path.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CachedResponse>,
    /// Bumped by every invalidation. A response rendered across a bump is
    /// not stored.
    generation: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let hit = self.entries.get(key).map(|e| e.clone())?;
        if hit.expires_at <= Instant::now() {
            self.entries.remove(key);
            return None;
        }
        Some(hit)
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Store `entry` unless an invalidation ran since `seen` was read.
    /// Expired entries are swept on the way in.
    fn store(&self, key: String, entry: CachedResponse, seen: u64) -> bool {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
        if self.generation() != seen {
            return false;
        }
        self.entries.insert(key.clone(), entry);
        // An invalidation may have landed between the check and the insert.
        if self.generation() != seen {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    /// Drop one path.
    pub fn invalidate_path(&self, path: &str) {
        self.bump();
        self.entries.remove(path);
        tracing::debug!(path, "revalidated path");
    }

    /// Drop a resource's list path and every detail path below it.
    pub fn invalidate_resource(&self, base: &str) {
        self.bump();
        let base = base.trim_end_matches('/');
        let detail_prefix = format!("{base}/");
        self.entries
            .retain(|key, _| key != base && !key.starts_with(&detail_prefix));
        tracing::debug!(base, "revalidated resource");
    }

    pub fn clear(&self) {
        self.bump();
        self.entries.clear();
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Middleware: serve public GETs from the cache, memoize fresh JSON ones.
pub async fn response_cache(
    State(cache): State<Arc<ResponseCache>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET || is_admin_request(req.uri().path(), req.headers()) {
        return next.run(req).await;
    }

    let key = req.uri().path().to_string();
    if let Some(hit) = cache.lookup(&key) {
        tracing::trace!(key = %key, "response cache hit");
        let mut res = Body::from(hit.body).into_response();
        let headers = res.headers_mut();
        if let Some(ct) = hit.content_type {
            headers.insert(header::CONTENT_TYPE, ct);
        }
        headers.insert(header::CACHE_CONTROL, hit.cache_control);
        headers.insert("x-cache", HeaderValue::from_static("HIT"));
        return res;
    }

    let seen = cache.generation();
    let res = next.run(req).await;

    let ttl = res
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("public"))
        .and_then(shared_max_age);

    let Some(ttl) = ttl else {
        return res;
    };
    let declared_len = res
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    if res.status() != StatusCode::OK || !is_json(res.headers()) || declared_len > MAX_CACHED_BODY {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let body = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "response too large to cache");
            return (StatusCode::INTERNAL_SERVER_ERROR, "response body error").into_response();
        }
    };

    if let Some(cache_control) = parts.headers.get(header::CACHE_CONTROL).cloned() {
        let stored = cache.store(
            key.clone(),
            CachedResponse {
                content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
                cache_control,
                body: body.clone(),
                expires_at: Instant::now() + Duration::from_secs(ttl),
            },
            seen,
        );
        if !stored {
            tracing::debug!(key = %key, "invalidated while rendering, not cached");
        }
    }

    parts.headers.insert("x-cache", HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(body))
}
