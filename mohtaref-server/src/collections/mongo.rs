use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mohtaref_core::errors::SiteError;
use mongodb::bson::{doc, to_bson, to_document, Document as BsonDocument};
use mongodb::error::{Error as MongoError, ErrorKind as MongoErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde_json::Value;

use super::{unique_conflict, unique_key, DocumentStore, Filter};
use crate::models::Document;

const DUPLICATE_KEY: i32 = 11000;

/// A MongoDB collection of `T`, keyed by hex-string `_id`s.
pub struct MongoCollection<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T: Document> MongoCollection<T> {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<T>(T::COLLECTION),
        }
    }

    /// Create the unique index backing the collection's unique key.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let Some(key) = T::UNIQUE_KEY else {
            return Ok(());
        };
        let mut keys = BsonDocument::new();
        keys.insert(key, 1);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await.map_err(map_mongo)?;
        tracing::debug!(collection = T::COLLECTION, key, "ensured unique index");
        Ok(())
    }

    fn sort() -> BsonDocument {
        if T::POSITIONED {
            doc! { "order": 1, "createdAt": 1, "_id": 1 }
        } else {
            doc! { "createdAt": 1, "_id": 1 }
        }
    }

    fn unique_filter(value: &Value) -> Result<BsonDocument> {
        let key = unique_key::<T>()?;
        let mut filter = BsonDocument::new();
        filter.insert(key, to_bson(value)?);
        Ok(filter)
    }

    /// `$set` the content fields, `$setOnInsert` the identity fields.
    fn upsert_update(doc: &T) -> Result<BsonDocument> {
        let mut fields = to_document(doc)?;
        let id = fields.remove("_id");
        let created_at = fields.remove("createdAt");
        Ok(doc! {
            "$set": fields,
            "$setOnInsert": { "_id": id, "createdAt": created_at },
        })
    }

    async fn upsert_once(
        &self,
        filter: &BsonDocument,
        update: &BsonDocument,
    ) -> std::result::Result<Option<T>, MongoError> {
        self.collection
            .find_one_and_update(filter.clone(), update.clone())
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        MongoErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        MongoErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_mongo(err: MongoError) -> anyhow::Error {
    let unavailable = matches!(
        err.kind.as_ref(),
        MongoErrorKind::ServerSelection { .. }
            | MongoErrorKind::Io(_)
            | MongoErrorKind::ConnectionPoolCleared { .. }
    );
    if unavailable {
        return SiteError::unavailable("Database unavailable")
            .with_source(err.into())
            .into_anyhow();
    }
    SiteError::general_error(format!("Database error: {err}"))
        .with_source(err.into())
        .into_anyhow()
}

fn map_write<T: Document>(err: MongoError, value: Option<Value>) -> anyhow::Error {
    if is_duplicate_key(&err) {
        return unique_conflict::<T>(&value.unwrap_or(Value::Null));
    }
    map_mongo(err)
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MongoCollection<T> {
    async fn list(&self, filter: &Filter) -> Result<Vec<T>> {
        let mut query = BsonDocument::new();
        for (field, value) in filter.conditions() {
            query.insert(field.clone(), to_bson(value)?);
        }

        let cursor = self
            .collection
            .find(query)
            .sort(Self::sort())
            .await
            .map_err(map_mongo)?;
        cursor.try_collect().await.map_err(map_mongo)
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo)
    }

    async fn find_unique(&self, value: &Value) -> Result<Option<T>> {
        let filter = Self::unique_filter(value)?;
        self.collection.find_one(filter).await.map_err(map_mongo)
    }

    async fn insert(&self, doc: T) -> Result<T> {
        self.collection
            .insert_one(&doc)
            .await
            .map_err(|e| map_write::<T>(e, doc.unique_value()))?;
        Ok(doc)
    }

    async fn replace(&self, doc: T) -> Result<Option<T>> {
        let res = self
            .collection
            .replace_one(doc! { "_id": doc.id() }, &doc)
            .await
            .map_err(|e| map_write::<T>(e, doc.unique_value()))?;
        Ok((res.matched_count > 0).then_some(doc))
    }

    async fn delete(&self, id: &str) -> Result<Option<T>> {
        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(map_mongo)
    }

    async fn upsert_by_key(&self, doc: T) -> Result<T> {
        let value = doc.unique_value().unwrap_or(Value::Null);
        let filter = Self::unique_filter(&value)?;
        let update = Self::upsert_update(&doc)?;

        // two racing upserts can both miss and insert; the loser retries
        // against the document the winner created
        let outcome = match self.upsert_once(&filter, &update).await {
            Err(err) if is_duplicate_key(&err) => self.upsert_once(&filter, &update).await,
            other => other,
        };

        outcome
            .map_err(|e| map_write::<T>(e, Some(value.clone())))?
            .ok_or_else(|| {
                SiteError::general_error(format!("{} upsert returned no document", T::LABEL))
                    .into_anyhow()
            })
    }

    async fn clear(&self) -> Result<u64> {
        let res = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(map_mongo)?;
        Ok(res.deleted_count)
    }
}
