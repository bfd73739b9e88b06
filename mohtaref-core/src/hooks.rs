use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::SiteConfigSnapshot;
use crate::service::ServiceMethodKind;

/// What a service call produced.
#[derive(Debug, Clone)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
    /// Output of a custom method.
    Value(Value),
}

impl<R> HookResult<R> {
    /// Every record carried by the result (none for custom values).
    pub fn records(&self) -> Vec<&R> {
        match self {
            HookResult::One(r) => vec![r],
            HookResult::Many(rs) => rs.iter().collect(),
            HookResult::Value(_) => Vec::new(),
        }
    }
}

/// Context passed to hooks.
///
/// R = record type
/// P = params type (request metadata)
pub struct HookContext<R, P> {
    pub service: String,
    pub method: ServiceMethodKind,
    pub id: Option<String>,
    pub params: P,
    /// Raw write payload (create/update/upsert/custom).
    pub data: Option<Value>,
    /// Stored document before an update or remove, when a hook loaded it.
    pub previous: Option<R>,
    pub result: Option<HookResult<R>>,
    pub error: Option<anyhow::Error>,
    pub config: SiteConfigSnapshot,
}

impl<R, P> HookContext<R, P> {
    pub fn new(
        service: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
        config: SiteConfigSnapshot,
    ) -> Self {
        Self {
            service: service.into(),
            method,
            id: None,
            params,
            data: None,
            previous: None,
            result: None,
            error: None,
            config,
        }
    }
}

#[async_trait]
pub trait BeforeHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait AfterHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

/// Error hooks see `ctx.error` set. Taking it out swallows the failure.
#[async_trait]
pub trait ErrorHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

/// Hook registrations for one service, in Feathers order:
/// `all` hooks run before method-specific ones.
pub struct ServiceHooks<R, P> {
    pub before_all: Vec<Arc<dyn BeforeHook<R, P>>>,
    pub before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook<R, P>>>>,
    pub after_all: Vec<Arc<dyn AfterHook<R, P>>>,
    pub after_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AfterHook<R, P>>>>,
    pub error_all: Vec<Arc<dyn ErrorHook<R, P>>>,
    pub error_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn ErrorHook<R, P>>>>,
}

impl<R, P> Default for ServiceHooks<R, P> {
    fn default() -> Self {
        Self {
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
            error_by_method: HashMap::new(),
        }
    }
}

const WRITE_METHODS: [ServiceMethodKind; 4] = [
    ServiceMethodKind::Create,
    ServiceMethodKind::Update,
    ServiceMethodKind::Remove,
    ServiceMethodKind::Upsert,
];

impl<R, P> ServiceHooks<R, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_all(&mut self, hook: Arc<dyn BeforeHook<R, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn BeforeHook<R, P>>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook<R, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn AfterHook<R, P>>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    /// Register the same after hook on create, update, remove and upsert.
    pub fn after_writes(&mut self, hook: Arc<dyn AfterHook<R, P>>) -> &mut Self {
        for method in WRITE_METHODS {
            self.after(method, hook.clone());
        }
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn ErrorHook<R, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: Arc<dyn ErrorHook<R, P>>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }

    pub(crate) fn collect(&self, method: &ServiceMethodKind) -> CollectedHooks<R, P> {
        CollectedHooks {
            before: collect_method_hooks(&self.before_all, &self.before_by_method, method),
            after: collect_method_hooks(&self.after_all, &self.after_by_method, method),
            error: collect_method_hooks(&self.error_all, &self.error_by_method, method),
        }
    }
}

pub(crate) struct CollectedHooks<R, P> {
    pub before: Vec<Arc<dyn BeforeHook<R, P>>>,
    pub after: Vec<Arc<dyn AfterHook<R, P>>>,
    pub error: Vec<Arc<dyn ErrorHook<R, P>>>,
}

fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: &ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out = all.to_vec();
    if let Some(specific) = by_method.get(method) {
        out.extend(specific.iter().cloned());
    }
    out
}
