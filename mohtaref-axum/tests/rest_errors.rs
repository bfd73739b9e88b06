use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use http_body_util::BodyExt;
use mohtaref_axum::{axum, CachePolicy, ResponseCache, RestParams};
use mohtaref_core::errors::SiteError;
use mohtaref_core::{ContentService, ServiceCapabilities, ServiceMethodKind, SiteApp};
use serde_json::{json, Value};
use tower::ServiceExt;

struct UnprocessableOnCreate;

#[async_trait::async_trait]
impl ContentService<Value, RestParams> for UnprocessableOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _data: Value, _params: RestParams) -> anyhow::Result<Value> {
        Err(SiteError::unprocessable("Invalid")
            .with_errors(json!({"title": ["required"]}))
            .into_anyhow())
    }
}

struct BoomOnCreate;

#[async_trait::async_trait]
impl ContentService<Value, RestParams> for BoomOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _data: Value, _params: RestParams) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("boom"))
    }
}

/// Echoes the admin flag so cache headers can be checked.
struct Listing;

#[async_trait::async_trait]
impl ContentService<Value, RestParams> for Listing {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Find, ServiceMethodKind::Get])
    }

    async fn find(&self, params: RestParams) -> anyhow::Result<Vec<Value>> {
        Ok(vec![json!({"admin": params.admin})])
    }

    async fn get(&self, id: &str, _params: RestParams) -> anyhow::Result<Value> {
        Ok(json!({"_id": id}))
    }
}

fn mount(path: &str, service: Arc<dyn ContentService<Value, RestParams>>) -> axum::Router {
    let app = SiteApp::new();
    let handle = app.register_service(path.trim_start_matches('/'), service);
    axum(app)
        .use_service(path, handle, CachePolicy::Content)
        .with_tracing()
        .router
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn malformed_json_returns_bad_request() {
    let router = mount("/posts", Arc::new(BoomOnCreate));

    let res = router.oneshot(post_json("/posts", "{\"title\":\"x\"")).await.unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert_eq!(body["className"], "bad-request");
    assert_eq!(body["success"], json!(false));
    assert!(body.get("errors").is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let router = mount("/posts", Arc::new(BoomOnCreate));

    let provided = HeaderValue::from_static("req-test-123");
    let mut req = post_json("/posts", "{\"title\":\"ok\"}");
    req.headers_mut().insert("x-request-id", provided.clone());

    let res = router.oneshot(req).await.unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn unprocessable_preserves_422_and_shape() {
    let router = mount("/posts", Arc::new(UnprocessableOnCreate));

    let res = router.oneshot(post_json("/posts", "{\"title\":\"ok\"}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["code"], 422);
    assert_eq!(body["className"], "unprocessable");
    assert_eq!(body["errors"], json!({"title": ["required"]}));
}

#[tokio::test]
async fn unstructured_error_maps_to_general_error() {
    let router = mount("/posts", Arc::new(BoomOnCreate));

    let res = router.oneshot(post_json("/posts", "{\"title\":\"ok\"}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["className"], "general-error");
    assert!(body["message"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn routes_outside_capabilities_are_not_mounted() {
    let router = mount("/posts", Arc::new(BoomOnCreate));

    let res = router
        .oneshot(Request::builder().uri("/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 405);
}

#[tokio::test]
async fn reads_carry_audience_specific_cache_headers() {
    let router = mount("/items", Arc::new(Listing));

    let res = router
        .clone()
        .oneshot(Request::builder().uri("/items/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        res.headers()["cache-control"],
        "public, s-maxage=600, stale-while-revalidate=1200"
    );

    let res = router
        .oneshot(
            Request::builder()
                .uri("/items")
                .header("x-admin-request", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers()["cache-control"], "no-store, no-cache, must-revalidate");
    assert_eq!(json_body(res).await, json!([{"admin": true}]));
}

#[tokio::test]
async fn public_reads_are_served_from_the_response_cache() {
    let app = SiteApp::new();
    let handle = app.register_service::<Value, RestParams>("items", Arc::new(Listing));
    let cache = ResponseCache::new();
    let router = axum(app)
        .use_service("/items", handle, CachePolicy::Media)
        .with_response_cache(cache.clone())
        .router;

    let first = router
        .clone()
        .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.headers()["x-cache"], "MISS");
    assert!(cache.contains("/items"));

    let second = router
        .clone()
        .oneshot(Request::builder().uri("/items").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(json_body(second).await, json!([{"admin": false}]));

    cache.invalidate_resource("/items");
    assert!(cache.is_empty());
}
