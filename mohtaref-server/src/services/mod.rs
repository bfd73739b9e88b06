//! Service registration.
//!
//! Every collection is a [`ContentService`](mohtaref_core::ContentService)
//! registered on the [`SiteApp`] under its collection name, with its
//! hooks attached. HTTP routing happens later, in [`crate::build`].

use std::sync::Arc;

use anyhow::Result;
use mohtaref_core::{ServiceHandle, SiteApp};

use crate::hooks::LogFailure;
use crate::models::{Banner, Document, GalleryImage, Project, Service, Testimonial, Video};

pub mod adapters;
pub mod banners;
pub mod gallery;
pub mod projects;
pub mod site_services;
pub mod testimonials;
pub mod types;
pub mod videos;

pub use types::{SiteParams, SiteState};

/// Handles of every registered service.
#[derive(Clone)]
pub struct Services {
    pub projects: Arc<ServiceHandle<Project, SiteParams>>,
    pub services: Arc<ServiceHandle<Service, SiteParams>>,
    pub testimonials: Arc<ServiceHandle<Testimonial, SiteParams>>,
    pub banners: Arc<ServiceHandle<Banner, SiteParams>>,
    pub gallery: Arc<ServiceHandle<GalleryImage, SiteParams>>,
    pub videos: Arc<ServiceHandle<Video, SiteParams>>,
}

pub fn configure(app: &SiteApp, state: &SiteState) -> Result<Services> {
    let projects = app.register_service(
        Project::COLLECTION,
        Arc::new(projects::ProjectsService::new(state)),
    );
    projects::projects_shared::register_hooks(&projects, state);

    let services = app.register_service(
        Service::COLLECTION,
        Arc::new(site_services::site_services_shared::service(state)),
    );
    site_services::site_services_shared::register_hooks(&services, state);

    let testimonials = app.register_service(
        Testimonial::COLLECTION,
        Arc::new(testimonials::TestimonialsService::new(state)),
    );

    let banners = app.register_service(
        Banner::COLLECTION,
        Arc::new(banners::BannersService::new(state)),
    );
    banners::banners_shared::register_hooks(&banners, state);

    let gallery = app.register_service(
        GalleryImage::COLLECTION,
        Arc::new(gallery::gallery_shared::service(state)),
    );
    gallery::gallery_shared::register_hooks(&gallery, state);

    let videos = app.register_service(
        Video::COLLECTION,
        Arc::new(videos::VideosService::new(state)),
    );
    videos::videos_shared::register_hooks(&videos, state);

    log_failures(&projects);
    log_failures(&services);
    log_failures(&testimonials);
    log_failures(&banners);
    log_failures(&gallery);
    log_failures(&videos);

    tracing::info!(services = ?app.service_names(), "services configured");

    Ok(Services {
        projects,
        services,
        testimonials,
        banners,
        gallery,
        videos,
    })
}

fn log_failures<R>(handle: &ServiceHandle<R, SiteParams>)
where
    R: Send + Sync + 'static,
{
    handle.hooks(|h| {
        h.error_all(Arc::new(LogFailure));
    });
}
