use std::sync::Arc;

use axum::handler::Handler;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use mohtaref_core::{ServiceHandle, SiteApp};
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::cache::{response_cache, CachePolicy, ResponseCache};
use crate::params::FromRestParams;
use crate::rest;

const REQUEST_ID: &str = "x-request-id";

/// Router builder around a [`SiteApp`].
#[derive(Clone)]
pub struct AxumApp {
    pub app: SiteApp,
    pub router: Router<()>,
}

impl AxumApp {
    pub fn new(app: SiteApp) -> Self {
        Self {
            app,
            router: Router::new(),
        }
    }

    /// Add routes that carry their own paths.
    pub fn merge(mut self, router: Router<()>) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// Mount a plain GET handler.
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Expose a registered service over REST at `path`.
    pub fn use_service<R, P>(
        mut self,
        path: &str,
        handle: Arc<ServiceHandle<R, P>>,
        policy: CachePolicy,
    ) -> Self
    where
        R: Serialize + Send + Sync + 'static,
        P: FromRestParams + Send + Sync + Clone + 'static,
    {
        tracing::debug!(path, service = handle.name(), "mounting service");
        let router = rest::service_router(handle, policy);
        self.router = self.router.nest(path, router);
        self
    }

    /// Serve public reads from the response cache.
    pub fn with_response_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.router = self
            .router
            .layer(axum::middleware::from_fn_with_state(cache, response_cache));
        self
    }

    /// Request ids and request tracing around everything mounted so far.
    pub fn with_tracing(mut self) -> Self {
        let header = HeaderName::from_static(REQUEST_ID);
        self.router = self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(header)),
        );
        self
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = ?listener.local_addr().ok(), "listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn axum(app: SiteApp) -> AxumApp {
    AxumApp::new(app)
}
