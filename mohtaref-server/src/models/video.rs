use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{is_url, Document, DocumentMeta};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(flatten)]
    pub meta: DocumentMeta,

    /// Object id in the `videos` bucket.
    #[validate(length(min = 1, message = "video is required"))]
    pub video: String,

    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_ar: Option<String>,

    /// Object id in the `images` bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(default)]
    pub order: i64,
}

impl Document for Video {
    const COLLECTION: &'static str = "videos";
    const LABEL: &'static str = "Video";
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
        self.thumbnail
            .as_deref()
            .filter(|v| !v.is_empty() && !is_url(v))
            .into_iter()
            .collect()
    }

    fn video_refs(&self) -> Vec<&str> {
        if self.video.is_empty() || is_url(&self.video) {
            Vec::new()
        } else {
            vec![self.video.as_str()]
        }
    }
}
