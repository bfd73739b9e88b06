pub mod projects_service;
pub mod projects_shared;

pub use projects_service::ProjectsService;
