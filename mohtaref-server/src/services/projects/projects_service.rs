use anyhow::Result;
use async_trait::async_trait;
use mohtaref_blob::{BlobAdapter, BlobError, Bucket};
use mohtaref_core::{ContentService, ServiceCapabilities};
use serde_json::Value;

use crate::collections::Filter;
use crate::models::{Document, Project};
use crate::services::adapters::DocumentAdapter;
use crate::services::{SiteParams, SiteState};

use super::projects_shared;

/// Projects, whose removal also releases their images.
pub struct ProjectsService {
    pub adapter: DocumentAdapter<Project>,
    pub blobs: BlobAdapter,
}

impl ProjectsService {
    pub fn new(state: &SiteState) -> Self {
        Self {
            adapter: DocumentAdapter::new(state.projects.clone())
                .with_capabilities(projects_shared::crud_capabilities()),
            blobs: state.blobs.clone(),
        }
    }
}

/// Best-effort release of images a removed document referenced. The
/// document is already gone, so failures are only logged.
pub(crate) async fn release_images(blobs: &BlobAdapter, ids: &[&str]) {
    for id in ids {
        match blobs.delete(Bucket::Images, id).await {
            Ok(()) => {}
            Err(BlobError::NotFound { .. }) => {
                tracing::debug!(id, "referenced image already gone");
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to release image");
            }
        }
    }
}

#[async_trait]
impl ContentService<Project, SiteParams> for ProjectsService {
    fn capabilities(&self) -> ServiceCapabilities {
        projects_shared::crud_capabilities()
    }

    async fn find(&self, _params: SiteParams) -> Result<Vec<Project>> {
        self.adapter._find(&Filter::all()).await
    }

    async fn get(&self, id: &str, _params: SiteParams) -> Result<Project> {
        self.adapter._get(id).await
    }

    async fn create(&self, data: Value, _params: SiteParams) -> Result<Project> {
        self.adapter._create(data).await
    }

    async fn update(&self, id: &str, data: Value, _params: SiteParams) -> Result<Project> {
        self.adapter._update(id, data).await
    }

    async fn remove(&self, id: &str, _params: SiteParams) -> Result<Project> {
        let removed = self.adapter._remove(id).await?;
        release_images(&self.blobs, &removed.image_refs()).await;
        Ok(removed)
    }
}
