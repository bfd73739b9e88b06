//! mohtaref-axum: Axum adapter for the Mohtaref content backend.
//!
//! Builds REST routers from registered services, renders structured
//! errors, applies Cache-Control policies and reads multipart uploads.

pub mod app;
pub mod cache;
mod error;
pub mod params;
pub mod rest;
pub mod state;
pub mod upload;

pub use app::{axum, AxumApp};
pub use cache::{CachePolicy, ResponseCache};
pub use error::SiteAxumError;
pub use params::{FromRestParams, RestParams};
pub use state::RestState;
pub use upload::{read_file_field, UploadedFile};
