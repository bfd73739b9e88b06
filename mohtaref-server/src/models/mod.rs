//! Document models of the site's six collections.

pub mod banner;
pub mod document;
pub mod gallery;
pub mod project;
pub mod service;
pub mod testimonial;
pub mod video;

pub use banner::{Banner, BannerPage};
pub use document::{
    is_url, list_order, new_document, patch_document, Document, DocumentMeta, SERVER_FIELDS,
};
pub use gallery::GalleryImage;
pub use project::Project;
pub use service::{Service, ServiceIcon};
pub use testimonial::Testimonial;
pub use video::Video;
