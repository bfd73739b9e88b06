use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::Instrument;

use crate::config::{SiteConfig, SiteConfigSnapshot};
use crate::errors::SiteError;
use crate::hooks::{HookContext, HookResult, ServiceHooks};
use crate::service::{ContentService, ServiceCapabilities, ServiceMethodKind};

struct SiteAppInner {
    config: Arc<RwLock<SiteConfig>>,
    // name -> Arc<ServiceHandle<R, P>> for whichever R, P was registered
    services: RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

/// SiteApp is the central application container.
///
/// Framework-agnostic. Holds:
/// - config
/// - named services, each with its own record type and hooks
#[derive(Clone)]
pub struct SiteApp {
    inner: Arc<SiteAppInner>,
}

impl Default for SiteApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteApp {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SiteAppInner {
                config: Arc::new(RwLock::new(SiteConfig::new())),
                services: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Feathers: `app.use(name, service)`
    pub fn register_service<R, P>(
        &self,
        name: impl Into<String>,
        service: Arc<dyn ContentService<R, P>>,
    ) -> Arc<ServiceHandle<R, P>>
    where
        R: Send + Sync + 'static,
        P: Send + Sync + Clone + 'static,
    {
        let name = name.into();
        let handle = Arc::new(ServiceHandle {
            name: name.clone(),
            service,
            hooks: RwLock::new(ServiceHooks::new()),
            config: self.inner.config.clone(),
        });

        tracing::debug!(service = %name, "registered service");
        self.inner
            .services
            .write()
            .insert(name, Box::new(handle.clone()));
        handle
    }

    /// Feathers: `app.service("name")`
    pub fn service<R, P>(&self, name: &str) -> Result<Arc<ServiceHandle<R, P>>>
    where
        R: Send + Sync + 'static,
        P: Send + Sync + Clone + 'static,
    {
        let map = self.inner.services.read();
        let any = map
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Service not found: {name}"))?;

        let handle = any
            .downcast_ref::<Arc<ServiceHandle<R, P>>>()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Service type mismatch for '{name}'. \
                     You requested a different <R,P> than what was registered."
                )
            })?;

        Ok(handle.clone())
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Feathers: `app.set(key, value)`
    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    /// Feathers: `app.get(key)`
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    /// Apply `PREFIX__A__B=value` environment variables.
    pub fn load_env(&self, prefix: &str) {
        self.inner.config.write().load_env_prefixed(prefix, std::env::vars());
    }

    pub fn config_snapshot(&self) -> SiteConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// A registered service together with its hooks.
///
/// Every call goes through the pipeline:
/// capability check → before → service → after (reverse) → error hooks.
pub struct ServiceHandle<R, P> {
    name: String,
    service: Arc<dyn ContentService<R, P>>,
    hooks: RwLock<ServiceHooks<R, P>>,
    config: Arc<RwLock<SiteConfig>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> ServiceCapabilities {
        self.service.capabilities()
    }

    pub fn inner(&self) -> &Arc<dyn ContentService<R, P>> {
        &self.service
    }

    /// Feathers: `app.service("x").hooks({ ... })`
    pub fn hooks<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        f(&mut self.hooks.write());
        self
    }

    fn context(&self, method: ServiceMethodKind, params: P) -> HookContext<R, P> {
        let config = self.config.read().snapshot();
        HookContext::new(self.name.clone(), method, params, config)
    }

    async fn dispatch(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        let svc = &self.service;
        let params = ctx.params.clone();
        let id = ctx.id.clone();

        let result = match ctx.method {
            ServiceMethodKind::Find => HookResult::Many(svc.find(params).await?),
            ServiceMethodKind::Get => HookResult::One(svc.get(required_id(&id)?, params).await?),
            ServiceMethodKind::Create => {
                HookResult::One(svc.create(required_data(ctx)?, params).await?)
            }
            ServiceMethodKind::Update => {
                let data = required_data(ctx)?;
                HookResult::One(svc.update(required_id(&id)?, data, params).await?)
            }
            ServiceMethodKind::Remove => {
                HookResult::One(svc.remove(required_id(&id)?, params).await?)
            }
            ServiceMethodKind::Upsert => {
                HookResult::One(svc.upsert(required_data(ctx)?, params).await?)
            }
            ServiceMethodKind::Custom(name) => {
                let data = ctx.data.clone();
                HookResult::Value(svc.custom(name, id.as_deref(), data, params).await?)
            }
        };

        ctx.result = Some(result);
        Ok(())
    }

    async fn run_pipeline(&self, mut ctx: HookContext<R, P>) -> Result<HookContext<R, P>> {
        if !self.service.capabilities().allows(&ctx.method) {
            return Err(SiteError::method_not_allowed(format!(
                "Method '{}' not allowed on service '{}'",
                ctx.method.name(),
                self.name
            ))
            .into_anyhow());
        }

        let hooks = self.hooks.read().collect(&ctx.method);

        let res: Result<()> = async {
            for h in &hooks.before {
                h.run(&mut ctx).await?;
            }

            // sets ctx.result
            self.dispatch(&mut ctx).await?;

            for h in hooks.after.iter().rev() {
                h.run(&mut ctx).await?;
            }
            Ok(())
        }
        .await;

        if let Err(e) = res {
            ctx.error = Some(e);

            for h in &hooks.error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    tracing::warn!(error = %hook_err, "error hook failed");
                }
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    async fn call(&self, ctx: HookContext<R, P>) -> Result<HookResult<R>> {
        let span = tracing::debug_span!(
            "service_call",
            service = %self.name,
            method = ctx.method.name(),
            id = ctx.id.as_deref().unwrap_or("")
        );

        let method = ctx.method.name();
        let ctx = self.run_pipeline(ctx).instrument(span).await?;
        ctx.result
            .ok_or_else(|| anyhow::anyhow!("{method}() produced no result"))
    }

    pub async fn find(&self, params: P) -> Result<Vec<R>> {
        let ctx = self.context(ServiceMethodKind::Find, params);
        match self.call(ctx).await? {
            HookResult::Many(v) => Ok(v),
            _ => Err(anyhow::anyhow!("find() produced a single result unexpectedly")),
        }
    }

    pub async fn get(&self, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Get, params);
        ctx.id = Some(id.to_string());
        one(self.call(ctx).await?, "get")
    }

    pub async fn create(&self, data: Value, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Create, params);
        ctx.data = Some(data);
        one(self.call(ctx).await?, "create")
    }

    pub async fn update(&self, id: &str, data: Value, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Update, params);
        ctx.id = Some(id.to_string());
        ctx.data = Some(data);
        one(self.call(ctx).await?, "update")
    }

    pub async fn remove(&self, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Remove, params);
        ctx.id = Some(id.to_string());
        one(self.call(ctx).await?, "remove")
    }

    pub async fn upsert(&self, data: Value, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Upsert, params);
        ctx.data = Some(data);
        one(self.call(ctx).await?, "upsert")
    }

    /// Run a custom method declared in the service capabilities.
    pub async fn custom(
        &self,
        method: &str,
        id: Option<&str>,
        data: Option<Value>,
        params: P,
    ) -> Result<Value> {
        let kind = self
            .service
            .capabilities()
            .allowed_methods
            .into_iter()
            .find(|m| matches!(m, ServiceMethodKind::Custom(name) if *name == method))
            .ok_or_else(|| {
                SiteError::method_not_allowed(format!(
                    "Method '{method}' not allowed on service '{}'",
                    self.name
                ))
                .into_anyhow()
            })?;

        let mut ctx = self.context(kind, params);
        ctx.id = id.map(str::to_string);
        ctx.data = data;

        match self.call(ctx).await? {
            HookResult::Value(v) => Ok(v),
            _ => Err(anyhow::anyhow!("{method}() produced a record unexpectedly")),
        }
    }
}

fn one<R>(result: HookResult<R>, method: &str) -> Result<R> {
    match result {
        HookResult::One(r) => Ok(r),
        _ => Err(anyhow::anyhow!("{method}() produced multiple results unexpectedly")),
    }
}

fn required_id(id: &Option<String>) -> Result<&str> {
    id.as_deref()
        .ok_or_else(|| SiteError::bad_request("An id is required").into_anyhow())
}

fn required_data<R, P>(ctx: &HookContext<R, P>) -> Result<Value> {
    ctx.data
        .clone()
        .ok_or_else(|| SiteError::bad_request("A request body is required").into_anyhow())
}
