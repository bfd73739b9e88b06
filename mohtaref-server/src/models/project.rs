use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{is_url, Document, DocumentMeta};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub meta: DocumentMeta,

    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "titleAr is required"))]
    pub title_ar: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "descriptionAr is required"))]
    pub description_ar: String,

    /// Object id in the `images` bucket, or a URL.
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,

    #[serde(default)]
    #[validate(length(max = 4, message = "Gallery images cannot exceed 4 images"))]
    pub gallery_images: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tags_ar: Vec<String>,

    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "categoryAr is required"))]
    pub category_ar: String,

    #[validate(length(min = 1, message = "year is required"))]
    pub year: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default)]
    pub featured: bool,
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "Project";

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }

    fn image_refs(&self) -> Vec<&str> {
        std::iter::once(self.image.as_str())
            .chain(self.gallery_images.iter().map(String::as_str))
            .filter(|v| !v.is_empty() && !is_url(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_document, patch_document};
    use mohtaref_core::{ErrorKind, SiteError};
    use serde_json::json;

    fn fields() -> serde_json::Value {
        json!({
            "title": "Wall opening",
            "titleAr": "فتحة جدار",
            "description": "Diamond wire cut",
            "descriptionAr": "قص بسلك الماس",
            "image": "6553a1f0c2b4e81a9f0d1234",
            "category": "Cutting",
            "categoryAr": "قص",
            "year": "2025"
        })
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let project: Project = new_document(fields()).unwrap();
        assert!(project.gallery_images.is_empty());
        assert!(project.tags.is_empty());
        assert!(!project.featured);
        assert_eq!(project.meta.id.len(), 24);
        assert_eq!(project.meta.created_at, project.meta.updated_at);
    }

    #[test]
    fn five_gallery_images_are_rejected() {
        let mut data = fields();
        data["galleryImages"] = json!(["a", "b", "c", "d", "e"]);

        let err = new_document::<Project>(data).unwrap_err();
        let site = SiteError::from_anyhow(&err).unwrap();
        assert_eq!(site.kind, ErrorKind::Unprocessable);
        assert_eq!(
            site.errors.as_ref().unwrap()["galleryImages"][0],
            "Gallery images cannot exceed 4 images"
        );
    }

    #[test]
    fn patch_keeps_identity_and_revalidates() {
        let stored: Project = new_document(fields()).unwrap();

        let patched = patch_document(&stored, json!({"featured": true, "_id": "x"})).unwrap();
        assert!(patched.featured);
        assert_eq!(patched.meta.id, stored.meta.id);
        assert_eq!(patched.meta.created_at, stored.meta.created_at);
        assert!(patched.meta.updated_at >= stored.meta.updated_at);

        let err = patch_document(&stored, json!({"galleryImages": ["1", "2", "3", "4", "5"]}))
            .unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::Unprocessable);
    }

    #[test]
    fn missing_required_field_is_unprocessable() {
        let mut data = fields();
        data.as_object_mut().unwrap().remove("year");
        let err = new_document::<Project>(data).unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::Unprocessable);
    }

    #[test]
    fn image_refs_skip_urls() {
        let mut data = fields();
        data["galleryImages"] = json!(["https://cdn/x.png", "6553a1f0c2b4e81a9f0d9999"]);
        let project: Project = new_document(data).unwrap();
        assert_eq!(
            project.image_refs(),
            vec!["6553a1f0c2b4e81a9f0d1234", "6553a1f0c2b4e81a9f0d9999"]
        );
    }
}
