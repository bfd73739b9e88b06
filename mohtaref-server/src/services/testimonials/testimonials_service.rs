use anyhow::Result;
use async_trait::async_trait;
use mohtaref_core::{ContentService, ServiceCapabilities};
use serde_json::Value;

use crate::collections::Filter;
use crate::models::{Document, Testimonial};
use crate::services::adapters::DocumentAdapter;
use crate::services::{SiteParams, SiteState};

/// Testimonials are moderated: the public only ever sees approved ones.
pub struct TestimonialsService {
    pub adapter: DocumentAdapter<Testimonial>,
}

impl TestimonialsService {
    pub fn new(state: &SiteState) -> Self {
        Self {
            adapter: DocumentAdapter::new(state.testimonials.clone()),
        }
    }
}

fn visible_to(params: &SiteParams) -> Filter {
    if params.admin {
        Filter::all()
    } else {
        Filter::eq("approved", true)
    }
}

#[async_trait]
impl ContentService<Testimonial, SiteParams> for TestimonialsService {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, params: SiteParams) -> Result<Vec<Testimonial>> {
        self.adapter._find(&visible_to(&params)).await
    }

    async fn get(&self, id: &str, params: SiteParams) -> Result<Testimonial> {
        let doc = self.adapter._get(id).await?;
        if !params.admin && !doc.approved {
            return Err(Testimonial::not_found(id));
        }
        Ok(doc)
    }

    async fn create(&self, data: Value, _params: SiteParams) -> Result<Testimonial> {
        self.adapter._create(data).await
    }

    async fn update(&self, id: &str, data: Value, _params: SiteParams) -> Result<Testimonial> {
        self.adapter._update(id, data).await
    }

    async fn remove(&self, id: &str, _params: SiteParams) -> Result<Testimonial> {
        self.adapter._remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{DocumentStore, MemoryCollection};
    use crate::models::new_document;
    use mohtaref_core::{ErrorKind, SiteError};
    use serde_json::json;
    use std::sync::Arc;

    async fn seeded() -> TestimonialsService {
        let store = Arc::new(MemoryCollection::<Testimonial>::new());
        for (name, approved) in [("A", true), ("B", false), ("C", true)] {
            let doc: Testimonial = new_document(json!({
                "name": name, "company": "Co", "rating": 5, "text": "ok", "approved": approved
            }))
            .unwrap();
            store.insert(doc).await.unwrap();
        }
        TestimonialsService {
            adapter: DocumentAdapter::new(store),
        }
    }

    fn public() -> SiteParams {
        SiteParams::default()
    }

    #[tokio::test]
    async fn public_listing_is_approved_only() {
        let svc = seeded().await;

        let public = svc.find(public()).await.unwrap();
        assert_eq!(public.len(), 2);
        assert!(public.iter().all(|t| t.approved));

        let admin = svc.find(SiteParams::internal()).await.unwrap();
        assert_eq!(admin.len(), 3);
    }

    #[tokio::test]
    async fn unapproved_testimonials_are_hidden_from_public_get() {
        let svc = seeded().await;
        let hidden = svc
            .find(SiteParams::internal())
            .await
            .unwrap()
            .into_iter()
            .find(|t| !t.approved)
            .unwrap();

        let err = svc.get(hidden.id(), public()).await.unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::NotFound);
        assert!(svc.get(hidden.id(), SiteParams::internal()).await.is_ok());
    }
}
