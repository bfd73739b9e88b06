use anyhow::Result;
use async_trait::async_trait;
use mohtaref_core::{ContentService, ServiceCapabilities};
use serde_json::Value;

use crate::collections::Filter;
use crate::models::Banner;
use crate::services::adapters::DocumentAdapter;
use crate::services::{SiteParams, SiteState};

use super::banners_shared;

/// One banner per page. Creating a banner for a page that already has
/// one replaces its content instead of adding a second document.
pub struct BannersService {
    pub adapter: DocumentAdapter<Banner>,
}

impl BannersService {
    pub fn new(state: &SiteState) -> Self {
        Self {
            adapter: DocumentAdapter::new(state.banners.clone())
                .with_capabilities(banners_shared::capabilities()),
        }
    }
}

#[async_trait]
impl ContentService<Banner, SiteParams> for BannersService {
    fn capabilities(&self) -> ServiceCapabilities {
        banners_shared::capabilities()
    }

    async fn find(&self, _params: SiteParams) -> Result<Vec<Banner>> {
        self.adapter._find(&Filter::all()).await
    }

    async fn get(&self, id: &str, _params: SiteParams) -> Result<Banner> {
        self.adapter._get(id).await
    }

    async fn create(&self, data: Value, _params: SiteParams) -> Result<Banner> {
        self.adapter._upsert(data).await
    }

    /// Moving a banner onto a page another banner holds is a `Conflict`.
    async fn update(&self, id: &str, data: Value, _params: SiteParams) -> Result<Banner> {
        self.adapter._update(id, data).await
    }

    async fn remove(&self, id: &str, _params: SiteParams) -> Result<Banner> {
        self.adapter._remove(id).await
    }

    async fn upsert(&self, data: Value, _params: SiteParams) -> Result<Banner> {
        self.adapter._upsert(data).await
    }
}
