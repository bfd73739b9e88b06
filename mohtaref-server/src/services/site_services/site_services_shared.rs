use std::sync::Arc;

use mohtaref_core::{ServiceHandle, ServiceMethodKind};

use crate::hooks::{CapturePrevious, InvalidateCache};
use crate::models::Service;
use crate::services::adapters::DocumentAdapter;
use crate::services::{SiteParams, SiteState};

/// Plain CRUD; deleting a service leaves its image in place.
pub fn service(state: &SiteState) -> DocumentAdapter<Service> {
    DocumentAdapter::new(state.services.clone())
}

pub fn register_hooks(handle: &ServiceHandle<Service, SiteParams>, state: &SiteState) {
    handle.hooks(|h| {
        h.before(
            ServiceMethodKind::Update,
            Arc::new(CapturePrevious {
                store: state.services.clone(),
            }),
        );
        h.after_writes(Arc::new(InvalidateCache::<Service>::new(
            state.cache.clone(),
            "/api/services",
        )));
    });
}
