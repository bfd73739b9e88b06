use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{is_url, Document, DocumentMeta};

/// Icons the public site knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceIcon {
    ConcreteCutting,
    ReinforcedConcrete,
    Drilling,
    CrackRepair,
    Demolition,
    Consultation,
    Phone,
    Banknote,
    Chair,
    Cloud,
}

/// An offered service (concrete cutting, drilling, ...).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Service {
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

    pub icon: ServiceIcon,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub features_ar: Vec<String>,

    #[serde(default)]
    pub featured: bool,
}

impl Document for Service {
    const COLLECTION: &'static str = "services";
    const LABEL: &'static str = "Service";

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }

    fn image_refs(&self) -> Vec<&str> {
        self.image
            .as_deref()
            .filter(|v| !v.is_empty() && !is_url(v))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_document;
    use mohtaref_core::{ErrorKind, SiteError};
    use serde_json::json;

    fn fields(icon: &str) -> serde_json::Value {
        json!({
            "title": "Drilling",
            "titleAr": "حفر",
            "description": "Core drilling",
            "descriptionAr": "حفر أساسي",
            "icon": icon,
        })
    }

    #[test]
    fn icon_names_are_kebab_case() {
        let service: Service = new_document(fields("crack-repair")).unwrap();
        assert_eq!(service.icon, ServiceIcon::CrackRepair);
        assert_eq!(serde_json::to_value(&service).unwrap()["icon"], "crack-repair");
    }

    #[test]
    fn unknown_icon_is_unprocessable() {
        let err = new_document::<Service>(fields("rocket")).unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::Unprocessable);
    }
}
