use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json, Router,
};
use mohtaref_core::errors::SiteError;
use mohtaref_core::{ServiceHandle, ServiceMethodKind};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    cache::CachePolicy,
    params::{FromRestParams, RestParams},
    RestState, SiteAxumError,
};

type QueryMap = Query<HashMap<String, String>>;

fn map_json_rejection(rejection: JsonRejection) -> SiteAxumError {
    SiteError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

fn rest_params(headers: &HeaderMap, query: HashMap<String, String>, method: Method, uri: &axum::http::Uri) -> RestParams {
    RestParams::from_parts("rest", headers, query, method.as_str(), uri)
}

/// JSON read response with the Cache-Control header for its audience.
fn read_response<T: Serialize>(value: T, policy: CachePolicy, admin: bool) -> Response {
    let mut res = Json(value).into_response();
    res.headers_mut()
        .insert(header::CACHE_CONTROL, policy.header_value(admin));
    res
}

async fn find<R, P>(
    State(state): State<RestState<R, P>>,
    headers: HeaderMap,
    method: Method,
    Query(query): QueryMap,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, SiteAxumError>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let params = rest_params(&headers, query, method, &uri);
    let admin = params.admin;
    let res = state.handle.find(P::from_rest_params(params)).await?;
    Ok(read_response(res, state.policy, admin))
}

async fn get<R, P>(
    State(state): State<RestState<R, P>>,
    headers: HeaderMap,
    method: Method,
    Query(query): QueryMap,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Response, SiteAxumError>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let params = rest_params(&headers, query, method, &uri);
    let admin = params.admin;
    let res = state.handle.get(&id, P::from_rest_params(params)).await?;
    Ok(read_response(res, state.policy, admin))
}

async fn create<R, P>(
    State(state): State<RestState<R, P>>,
    headers: HeaderMap,
    method: Method,
    Query(query): QueryMap,
    OriginalUri(uri): OriginalUri,
    data: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R>, SiteAxumError>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let params = P::from_rest_params(rest_params(&headers, query, method, &uri));
    let res = state.handle.create(data, params).await?;
    Ok(Json(res))
}

async fn upsert<R, P>(
    State(state): State<RestState<R, P>>,
    headers: HeaderMap,
    method: Method,
    Query(query): QueryMap,
    OriginalUri(uri): OriginalUri,
    data: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R>, SiteAxumError>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let params = P::from_rest_params(rest_params(&headers, query, method, &uri));
    let res = state.handle.upsert(data, params).await?;
    Ok(Json(res))
}

/// PUT and PATCH are both partial updates.
async fn update<R, P>(
    State(state): State<RestState<R, P>>,
    headers: HeaderMap,
    method: Method,
    Query(query): QueryMap,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    data: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R>, SiteAxumError>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let params = P::from_rest_params(rest_params(&headers, query, method, &uri));
    let res = state.handle.update(&id, data, params).await?;
    Ok(Json(res))
}

async fn remove<R, P>(
    State(state): State<RestState<R, P>>,
    headers: HeaderMap,
    method: Method,
    Query(query): QueryMap,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<R>, SiteAxumError>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let params = P::from_rest_params(rest_params(&headers, query, method, &uri));
    let res = state.handle.remove(&id, params).await?;
    Ok(Json(res))
}

/// Build a router for a service, mounting only the methods it allows:
///
/// - `GET /` find, `POST /` create, `PUT /` upsert
/// - `GET /{id}` get, `PUT|PATCH /{id}` update, `DELETE /{id}` remove
pub fn service_router<R, P>(handle: Arc<ServiceHandle<R, P>>, policy: CachePolicy) -> Router<()>
where
    R: Serialize + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let caps = handle.capabilities();
    let state = RestState::new(handle, policy);

    let mut root: MethodRouter<RestState<R, P>> = MethodRouter::new();
    if caps.allows(&ServiceMethodKind::Find) {
        root = root.get(find::<R, P>);
    }
    if caps.allows(&ServiceMethodKind::Create) {
        root = root.post(create::<R, P>);
    }
    if caps.allows(&ServiceMethodKind::Upsert) {
        root = root.put(upsert::<R, P>);
    }

    let mut by_id: MethodRouter<RestState<R, P>> = MethodRouter::new();
    if caps.allows(&ServiceMethodKind::Get) {
        by_id = by_id.get(get::<R, P>);
    }
    if caps.allows(&ServiceMethodKind::Update) {
        by_id = by_id.put(update::<R, P>).patch(update::<R, P>);
    }
    if caps.allows(&ServiceMethodKind::Remove) {
        by_id = by_id.delete(remove::<R, P>);
    }

    Router::new()
        .route("/", root)
        .route("/{id}", by_id)
        .with_state(state)
}
