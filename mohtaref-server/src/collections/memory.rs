use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;

use super::{unique_conflict, unique_key, DocumentStore, Filter};
use crate::models::{list_order, Document};

/// In-process collection. One write lock serializes every mutation, so a
/// unique-key check and the write it guards happen atomically.
pub struct MemoryCollection<T> {
    docs: RwLock<Vec<T>>,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Document> MemoryCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn clash(docs: &[T], doc: &T) -> Option<Value> {
        let value = doc.unique_value()?;
        docs.iter()
            .any(|other| other.id() != doc.id() && other.unique_value().as_ref() == Some(&value))
            .then_some(value)
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MemoryCollection<T> {
    async fn list(&self, filter: &Filter) -> Result<Vec<T>> {
        let mut out: Vec<T> = self
            .docs
            .read()
            .iter()
            .filter(|doc| filter.matches(*doc))
            .cloned()
            .collect();
        out.sort_by(list_order::<T>);
        Ok(out)
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        Ok(self.docs.read().iter().find(|d| d.id() == id).cloned())
    }

    async fn find_unique(&self, value: &Value) -> Result<Option<T>> {
        unique_key::<T>()?;
        Ok(self
            .docs
            .read()
            .iter()
            .find(|d| d.unique_value().as_ref() == Some(value))
            .cloned())
    }

    async fn insert(&self, doc: T) -> Result<T> {
        let mut docs = self.docs.write();
        if let Some(value) = Self::clash(&docs, &doc) {
            return Err(unique_conflict::<T>(&value));
        }
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn replace(&self, doc: T) -> Result<Option<T>> {
        let mut docs = self.docs.write();
        let Some(index) = docs.iter().position(|d| d.id() == doc.id()) else {
            return Ok(None);
        };
        if let Some(value) = Self::clash(&docs, &doc) {
            return Err(unique_conflict::<T>(&value));
        }
        docs[index] = doc.clone();
        Ok(Some(doc))
    }

    async fn delete(&self, id: &str) -> Result<Option<T>> {
        let mut docs = self.docs.write();
        Ok(docs
            .iter()
            .position(|d| d.id() == id)
            .map(|index| docs.remove(index)))
    }

    async fn upsert_by_key(&self, mut doc: T) -> Result<T> {
        unique_key::<T>()?;
        let value = doc.unique_value();

        let mut docs = self.docs.write();
        let existing = docs
            .iter()
            .position(|d| value.is_some() && d.unique_value() == value);

        match existing {
            Some(index) => {
                let kept = docs[index].meta().clone();
                let meta = doc.meta_mut();
                meta.id = kept.id;
                meta.created_at = kept.created_at;
                meta.updated_at = Utc::now();
                docs[index] = doc.clone();
            }
            None => docs.push(doc.clone()),
        }
        Ok(doc)
    }

    async fn clear(&self) -> Result<u64> {
        let mut docs = self.docs.write();
        let removed = docs.len() as u64;
        docs.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_document, patch_document, Banner, GalleryImage};
    use mohtaref_core::{ErrorKind, SiteError};
    use serde_json::json;
    use std::sync::Arc;

    fn banner(page: &str, image: &str) -> Banner {
        new_document(json!({"page": page, "image": image})).unwrap()
    }

    #[tokio::test]
    async fn upsert_keeps_one_banner_per_page() {
        let store = MemoryCollection::<Banner>::new();

        let first = store.upsert_by_key(banner("home", "a")).await.unwrap();
        let second = store.upsert_by_key(banner("home", "b")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(second.meta.id, first.meta.id);
        assert_eq!(second.meta.created_at, first.meta.created_at);
        assert_eq!(store.list(&Filter::all()).await.unwrap()[0].image, "b");
    }

    #[tokio::test]
    async fn concurrent_upserts_converge() {
        let store = Arc::new(MemoryCollection::<Banner>::new());

        let writes = (0..16).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.upsert_by_key(banner("contact", &format!("img{i}"))).await })
        });
        for write in futures::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn moving_a_banner_onto_a_taken_page_conflicts() {
        let store = MemoryCollection::<Banner>::new();
        store.insert(banner("home", "a")).await.unwrap();
        let about = store.insert(banner("about", "b")).await.unwrap();

        let moved = patch_document(&about, json!({"page": "home"})).unwrap();
        let err = store.replace(moved).await.unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::Conflict);

        let err = store.insert(banner("about", "c")).await.unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn positioned_collections_list_by_order_then_creation() {
        let store = MemoryCollection::<GalleryImage>::new();
        for (alt, order) in [("c", 2), ("a", 0), ("b", 0)] {
            let img: GalleryImage =
                new_document(json!({"image": "x", "alt": alt, "order": order})).unwrap();
            store.insert(img).await.unwrap();
        }

        let alts: Vec<String> = store
            .list(&Filter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.alt)
            .collect();
        assert_eq!(alts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn missing_documents_are_none() {
        let store = MemoryCollection::<GalleryImage>::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.delete("nope").await.unwrap().is_none());

        let img: GalleryImage = new_document(json!({"image": "x", "alt": "y"})).unwrap();
        assert!(store.replace(img).await.unwrap().is_none());
    }
}
