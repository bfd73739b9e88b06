//! Shared shape of every stored document.
//!
//! Each entity flattens a [`DocumentMeta`] (`_id`, `createdAt`, `updatedAt`)
//! next to its own camelCase fields. Writes arrive as raw JSON and go
//! through [`new_document`] or [`patch_document`], which assign the
//! server-owned fields, apply serde defaults and run `validator` rules
//! before anything reaches a store.

use std::cmp::Ordering;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use mohtaref_core::errors::SiteError;
use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Fields owned by the server. Clients can never write them.
pub const SERVER_FIELDS: [&str; 3] = ["_id", "createdAt", "updatedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl DocumentMeta {
    pub fn fresh() -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new().to_hex(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// RFC 3339 with fixed millisecond precision, so stored strings sort
/// the same way the instants do.
pub mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// A stored entity.
pub trait Document:
    Serialize + DeserializeOwned + Validate + Clone + Send + Sync + Unpin + 'static
{
    /// Collection name, also the REST path segment.
    const COLLECTION: &'static str;
    /// Human label used in messages ("Project not found").
    const LABEL: &'static str;
    /// Field that must be unique across the collection, if any.
    const UNIQUE_KEY: Option<&'static str> = None;
    /// Listed by `order` then creation time instead of creation time alone.
    const POSITIONED: bool = false;

    fn meta(&self) -> &DocumentMeta;
    fn meta_mut(&mut self) -> &mut DocumentMeta;

    /// Display position for positioned collections.
    fn position(&self) -> i64 {
        0
    }

    /// Identifiers this document holds in the `images` bucket.
    fn image_refs(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Identifiers this document holds in the `videos` bucket.
    fn video_refs(&self) -> Vec<&str> {
        Vec::new()
    }

    fn id(&self) -> &str {
        &self.meta().id
    }

    /// Value of the unique key, as JSON.
    fn unique_value(&self) -> Option<Value> {
        let key = Self::UNIQUE_KEY?;
        serde_json::to_value(self).ok()?.get(key).cloned()
    }

    fn not_found(id: &str) -> anyhow::Error {
        SiteError::not_found(format!("{} not found: {id}", Self::LABEL)).into_anyhow()
    }
}

/// Default listing order: position first when the collection has one,
/// then creation time. `sort_by` is stable, so ties keep insertion order.
pub fn list_order<T: Document>(a: &T, b: &T) -> Ordering {
    let by_position = if T::POSITIONED {
        a.position().cmp(&b.position())
    } else {
        Ordering::Equal
    };
    by_position.then_with(|| a.meta().created_at.cmp(&b.meta().created_at))
}

/// Build a new document from client fields.
pub fn new_document<T: Document>(data: Value) -> Result<T> {
    let mut fields = client_fields::<T>(data)?;
    fields.retain(|_, v| !v.is_null());
    let meta = DocumentMeta::fresh();
    insert_meta(&mut fields, &meta);
    decode(fields)
}

/// Merge client fields onto a stored document. `_id` and `createdAt`
/// are kept, `updatedAt` is refreshed, and the merged result is
/// validated as a whole.
pub fn patch_document<T: Document>(stored: &T, patch: Value) -> Result<T> {
    let patch = client_fields::<T>(patch)?;

    let mut merged = match serde_json::to_value(stored)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        // an explicit null clears an optional field
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }

    let mut meta = stored.meta().clone();
    meta.updated_at = Utc::now();
    insert_meta(&mut merged, &meta);
    decode(merged)
}

fn client_fields<T: Document>(data: Value) -> Result<Map<String, Value>> {
    let Value::Object(mut fields) = data else {
        return Err(SiteError::bad_request(format!(
            "{} payload must be a JSON object",
            T::LABEL
        ))
        .into_anyhow());
    };
    for key in SERVER_FIELDS {
        fields.remove(key);
    }
    Ok(fields)
}

fn insert_meta(fields: &mut Map<String, Value>, meta: &DocumentMeta) {
    fields.insert("_id".into(), Value::String(meta.id.clone()));
    fields.insert("createdAt".into(), Value::String(timestamp::format(&meta.created_at)));
    fields.insert("updatedAt".into(), Value::String(timestamp::format(&meta.updated_at)));
}

fn decode<T: Document>(fields: Map<String, Value>) -> Result<T> {
    let message = format!("{} validation failed", T::LABEL);

    let doc: T = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        SiteError::unprocessable(message.clone())
            .with_errors(json!({ "_schema": [e.to_string()] }))
            .into_anyhow()
    })?;

    doc.validate().map_err(|e| {
        SiteError::unprocessable(message)
            .with_errors(validation_errors_json(&e))
            .into_anyhow()
    })?;

    Ok(doc)
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "url" => Some("must be a valid URL"),
        _ => None,
    }
}

/// Struct field names come from Rust; clients know the camelCase names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `{ "field": ["message", ...] }`
pub fn validation_errors_json(errs: &ValidationErrors) -> Value {
    let mut out = Map::new();
    for (field, kind) in errs.errors() {
        let ValidationErrorsKind::Field(field_errors) = kind else {
            continue;
        };
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .or_else(|| friendly_message(&e.code).map(str::to_string))
                    .unwrap_or_else(|| e.code.to_string())
            })
            .map(Value::String)
            .collect();
        out.insert(camel_case(field), Value::Array(messages));
    }
    Value::Object(out)
}

/// Whether a stored media value is already a URL rather than an object id.
pub fn is_url(value: &str) -> bool {
    value.starts_with("http") || value.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_matches_wire_names() {
        assert_eq!(camel_case("gallery_images"), "galleryImages");
        assert_eq!(camel_case("title"), "title");
        assert_eq!(camel_case("description_ar"), "descriptionAr");
    }

    #[test]
    fn timestamps_have_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2025-11-14T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp::format(&ts), "2025-11-14T08:00:00.000Z");
    }

    #[test]
    fn urls_are_told_apart_from_object_ids() {
        assert!(is_url("https://cdn.example.com/a.png"));
        assert!(is_url("/images/hero.webp"));
        assert!(!is_url("6553a1f0c2b4e81a9f0d1234"));
    }
}
