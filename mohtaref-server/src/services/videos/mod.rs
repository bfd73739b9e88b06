pub mod videos_service;
pub mod videos_shared;

pub use videos_service::VideosService;
