//! # Document collections
//!
//! Storage of typed documents behind [`DocumentStore`]. Services only see
//! the trait; the process picks [`MemoryCollection`] or [`MongoCollection`]
//! at startup.
//!
//! Stores do not validate: documents reach them already built by
//! [`crate::models::new_document`] / [`crate::models::patch_document`].
//! Stores do enforce the collection's unique key and its listing order.

mod memory;
mod mongo;

use anyhow::Result;
use async_trait::async_trait;
use mohtaref_core::errors::SiteError;
use serde::Serialize;
use serde_json::Value;

use crate::models::Document;

pub use memory::MemoryCollection;
pub use mongo::MongoCollection;

/// Equality filter over top-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    eq: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.eq
    }

    pub fn is_empty(&self) -> bool {
        self.eq.is_empty()
    }

    pub fn matches<T: Serialize>(&self, doc: &T) -> bool {
        if self.eq.is_empty() {
            return true;
        }
        let Ok(value) = serde_json::to_value(doc) else {
            return false;
        };
        self.eq
            .iter()
            .all(|(field, expected)| value.get(field) == Some(expected))
    }
}

#[async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    /// Documents matching `filter`, in the collection's listing order.
    async fn list(&self, filter: &Filter) -> Result<Vec<T>>;

    async fn get(&self, id: &str) -> Result<Option<T>>;

    /// The document holding `value` under the collection's unique key.
    async fn find_unique(&self, value: &Value) -> Result<Option<T>>;

    /// Store a new document. A unique-key clash is a `Conflict`.
    async fn insert(&self, doc: T) -> Result<T>;

    /// Replace the document with the same id. `None` when it does not exist.
    async fn replace(&self, doc: T) -> Result<Option<T>>;

    /// Remove a document, returning it. `None` when it does not exist.
    async fn delete(&self, id: &str) -> Result<Option<T>>;

    /// Create or overwrite the document holding `doc`'s unique value.
    ///
    /// An existing document keeps its `_id` and `createdAt`. Concurrent
    /// upserts of the same key converge on one document.
    async fn upsert_by_key(&self, doc: T) -> Result<T>;

    /// Remove every document, returning how many were removed.
    async fn clear(&self) -> Result<u64>;
}

pub(crate) fn unique_key<T: Document>() -> Result<&'static str> {
    T::UNIQUE_KEY.ok_or_else(|| {
        SiteError::method_not_allowed(format!("{} has no unique key to upsert by", T::LABEL))
            .into_anyhow()
    })
}

pub(crate) fn unique_conflict<T: Document>(value: &Value) -> anyhow::Error {
    let key = T::UNIQUE_KEY.unwrap_or("key");
    let shown = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
    SiteError::conflict(format!("A {} for {key} '{shown}' already exists", T::LABEL.to_lowercase()))
        .with_data(serde_json::json!({ key: value }))
        .into_anyhow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_top_level_fields() {
        let doc = json!({"approved": true, "rating": 5});
        assert!(Filter::all().matches(&doc));
        assert!(Filter::eq("approved", true).matches(&doc));
        assert!(!Filter::eq("approved", false).matches(&doc));
        assert!(!Filter::eq("approved", true).and_eq("rating", 4).matches(&doc));
        assert!(!Filter::eq("missing", 1).matches(&doc));
    }
}
