//! Hooks shared by every document service.

use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use mohtaref_axum::ResponseCache;
use mohtaref_core::errors::SiteError;
use mohtaref_core::hooks::{AfterHook, BeforeHook, ErrorHook, HookContext};
use mohtaref_core::ServiceMethodKind;

use crate::collections::DocumentStore;
use crate::media_url::{image_url, video_url};
use crate::models::Document;
use crate::services::SiteParams;

/// Load the stored document a write is about to change into
/// `ctx.previous`: by id for update/remove, by unique key for
/// create/upsert on keyed collections.
pub struct CapturePrevious<T: Document> {
    pub store: Arc<dyn DocumentStore<T>>,
}

#[async_trait]
impl<T: Document> BeforeHook<T, SiteParams> for CapturePrevious<T> {
    async fn run(&self, ctx: &mut HookContext<T, SiteParams>) -> Result<()> {
        ctx.previous = match ctx.method {
            ServiceMethodKind::Update | ServiceMethodKind::Remove => match ctx.id.as_deref() {
                Some(id) => self.store.get(id).await?,
                None => None,
            },
            ServiceMethodKind::Create | ServiceMethodKind::Upsert => {
                let key_value = T::UNIQUE_KEY
                    .and_then(|key| ctx.data.as_ref()?.get(key).cloned());
                match key_value {
                    Some(value) => self.store.find_unique(&value).await?,
                    None => None,
                }
            }
            _ => None,
        };
        Ok(())
    }
}

/// Drop cached responses a write made stale: the resource's list and
/// detail paths, plus the media routes of every object the old and the
/// new document reference.
pub struct InvalidateCache<T> {
    pub cache: Arc<ResponseCache>,
    pub base: String,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Document> InvalidateCache<T> {
    pub fn new(cache: Arc<ResponseCache>, base: impl Into<String>) -> Self {
        Self {
            cache,
            base: base.into(),
            _doc: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Document> AfterHook<T, SiteParams> for InvalidateCache<T> {
    async fn run(&self, ctx: &mut HookContext<T, SiteParams>) -> Result<()> {
        self.cache.invalidate_resource(&self.base);

        let current = ctx.result.as_ref().map(|r| r.records()).unwrap_or_default();
        for doc in ctx.previous.iter().chain(current) {
            for id in doc.image_refs() {
                self.cache.invalidate_path(&image_url(id));
            }
            for id in doc.video_refs() {
                self.cache.invalidate_path(&video_url(id));
            }
        }
        Ok(())
    }
}

/// Log failed service calls. Server-side failures at `warn`, rejected
/// requests at `debug`. Never swallows the error.
pub struct LogFailure;

#[async_trait]
impl<R, P> ErrorHook<R, P> for LogFailure
where
    R: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        let Some(err) = ctx.error.as_ref() else {
            return Ok(());
        };
        let code = SiteError::kind_of(err).status_code();
        if code >= 500 {
            tracing::warn!(service = %ctx.service, method = ctx.method.name(), code, error = %err, "service call failed");
        } else {
            tracing::debug!(service = %ctx.service, method = ctx.method.name(), code, error = %err, "service call rejected");
        }
        Ok(())
    }
}
