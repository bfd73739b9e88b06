use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{is_url, Document, DocumentMeta};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    #[serde(flatten)]
    pub meta: DocumentMeta,

    /// Object id in the `images` bucket, or a URL.
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,

    #[validate(length(min = 1, message = "alt is required"))]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_ar: Option<String>,

    #[serde(default)]
    pub order: i64,
}

impl Document for GalleryImage {
    const COLLECTION: &'static str = "gallery";
    const LABEL: &'static str = "Gallery image";
    const POSITIONED: bool = true;

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }

    fn position(&self) -> i64 {
        self.order
    }

    fn image_refs(&self) -> Vec<&str> {
        if self.image.is_empty() || is_url(&self.image) {
            Vec::new()
        } else {
            vec![self.image.as_str()]
        }
    }
}
