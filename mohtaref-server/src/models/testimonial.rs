use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{Document, DocumentMeta};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(flatten)]
    pub meta: DocumentMeta,

    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "company is required"))]
    pub company: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(min = 1, message = "text is required"))]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_ar: Option<String>,

    /// Only approved testimonials are shown publicly.
    #[serde(default)]
    pub approved: bool,
}

impl Document for Testimonial {
    const COLLECTION: &'static str = "testimonials";
    const LABEL: &'static str = "Testimonial";

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_document;
    use mohtaref_core::{ErrorKind, SiteError};
    use serde_json::json;

    fn with_rating(rating: i64) -> serde_json::Value {
        json!({"name": "Sara", "company": "Binaa", "rating": rating, "text": "Clean cuts"})
    }

    #[test]
    fn rating_must_be_between_one_and_five() {
        for rating in [0, 6] {
            let err = new_document::<Testimonial>(with_rating(rating)).unwrap_err();
            let site = SiteError::from_anyhow(&err).unwrap();
            assert_eq!(site.kind, ErrorKind::Unprocessable);
            assert!(site.errors.as_ref().unwrap().get("rating").is_some());
        }

        for rating in [1, 5] {
            let ok: Testimonial = new_document(with_rating(rating)).unwrap();
            assert!(!ok.approved);
        }
    }
}
