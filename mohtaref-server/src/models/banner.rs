use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{is_url, Document, DocumentMeta};

/// Pages that carry a hero banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerPage {
    Home,
    Contact,
    About,
}

/// Hero image of a page. At most one per page.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(flatten)]
    pub meta: DocumentMeta,

    pub page: BannerPage,

    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
}

impl Document for Banner {
    const COLLECTION: &'static str = "banners";
    const LABEL: &'static str = "Banner";
    const UNIQUE_KEY: Option<&'static str> = Some("page");

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }

    fn image_refs(&self) -> Vec<&str> {
        if self.image.is_empty() || is_url(&self.image) {
            Vec::new()
        } else {
            vec![self.image.as_str()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_document;
    use serde_json::json;

    #[test]
    fn unique_value_is_the_page() {
        let banner: Banner = new_document(json!({"page": "about", "image": "/hero.webp"})).unwrap();
        assert_eq!(banner.unique_value(), Some(json!("about")));
        assert!(banner.image_refs().is_empty());
    }

    #[test]
    fn unknown_page_is_rejected() {
        assert!(new_document::<Banner>(json!({"page": "blog", "image": "x"})).is_err());
    }
}
