pub mod gallery_shared;
