//! Core building blocks for the Mohtaref content backend:
//! the service trait, the hook pipeline, configuration and structured errors.

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod service;

pub use app::{ServiceHandle, SiteApp};
pub use config::{SiteConfig, SiteConfigSnapshot};
pub use errors::{ErrorKind, SiteError, SiteResult};
pub use hooks::{AfterHook, BeforeHook, ErrorHook, HookContext, HookResult, ServiceHooks};
pub use service::{ContentService, ServiceCapabilities, ServiceMethodKind};
