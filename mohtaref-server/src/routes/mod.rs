pub mod media;

pub use media::{media_router, MediaState};
