use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use mohtaref_core::{ContentService, ServiceCapabilities};
use serde_json::Value;

use crate::collections::{DocumentStore, Filter};
use crate::models::{new_document, patch_document, Document};
use crate::services::SiteParams;

/// CRUD over one document collection.
///
/// Collections without special behaviour are served by the adapter
/// directly; the others wrap it and override what differs.
pub struct DocumentAdapter<T: Document> {
    pub store: Arc<dyn DocumentStore<T>>,
    pub capabilities: ServiceCapabilities,
}

impl<T: Document> DocumentAdapter<T> {
    pub fn new(store: Arc<dyn DocumentStore<T>>) -> Self {
        Self {
            store,
            capabilities: ServiceCapabilities::standard_crud(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: ServiceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub async fn _find(&self, filter: &Filter) -> Result<Vec<T>> {
        self.store.list(filter).await
    }

    pub async fn _get(&self, id: &str) -> Result<T> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| T::not_found(id))
    }

    pub async fn _create(&self, data: Value) -> Result<T> {
        let doc = self.store.insert(new_document::<T>(data)?).await?;
        tracing::info!(collection = T::COLLECTION, id = doc.id(), "created document");
        Ok(doc)
    }

    /// Partial update; concurrent updates are last-write-wins.
    pub async fn _update(&self, id: &str, data: Value) -> Result<T> {
        let stored = self._get(id).await?;
        let patched = patch_document(&stored, data)?;
        let doc = self
            .store
            .replace(patched)
            .await?
            .ok_or_else(|| T::not_found(id))?;
        tracing::info!(collection = T::COLLECTION, id, "updated document");
        Ok(doc)
    }

    pub async fn _remove(&self, id: &str) -> Result<T> {
        let doc = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| T::not_found(id))?;
        tracing::info!(collection = T::COLLECTION, id, "removed document");
        Ok(doc)
    }

    pub async fn _upsert(&self, data: Value) -> Result<T> {
        let doc = self.store.upsert_by_key(new_document::<T>(data)?).await?;
        tracing::info!(collection = T::COLLECTION, id = doc.id(), "upserted document");
        Ok(doc)
    }
}

#[async_trait]
impl<T: Document> ContentService<T, SiteParams> for DocumentAdapter<T> {
    fn capabilities(&self) -> ServiceCapabilities {
        self.capabilities.clone()
    }

    async fn find(&self, _params: SiteParams) -> Result<Vec<T>> {
        self._find(&Filter::all()).await
    }

    async fn get(&self, id: &str, _params: SiteParams) -> Result<T> {
        self._get(id).await
    }

    async fn create(&self, data: Value, _params: SiteParams) -> Result<T> {
        self._create(data).await
    }

    async fn update(&self, id: &str, data: Value, _params: SiteParams) -> Result<T> {
        self._update(id, data).await
    }

    async fn remove(&self, id: &str, _params: SiteParams) -> Result<T> {
        self._remove(id).await
    }

    async fn upsert(&self, data: Value, _params: SiteParams) -> Result<T> {
        self._upsert(data).await
    }
}
