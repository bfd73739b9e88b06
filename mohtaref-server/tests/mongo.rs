//! Runs against a live MongoDB:
//! `MONGODB_URI=mongodb://localhost:27017 cargo test -p mohtaref-server -- --ignored`

use std::sync::Arc;

use mohtaref_server::collections::{DocumentStore, Filter, MongoCollection};
use mohtaref_server::models::{new_document, Banner, Testimonial};
use mongodb::{Client, Database};
use serde_json::json;

async fn database() -> Database {
    let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let client = Client::with_uri_str(&uri).await.expect("connect to MongoDB");
    client.database("mohtaref_server_test")
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn concurrent_banner_upserts_converge() {
    let store = Arc::new(MongoCollection::<Banner>::new(&database().await));
    store.ensure_indexes().await.unwrap();
    store.clear().await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let banner: Banner =
                new_document(json!({"page": "contact", "image": format!("img-{i}")})).unwrap();
            store.upsert_by_key(banner).await.unwrap()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().meta.id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.list(&Filter::all()).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn approved_filter_runs_server_side() {
    let store = MongoCollection::<Testimonial>::new(&database().await);
    store.clear().await.unwrap();

    for (name, approved) in [("A", true), ("B", false)] {
        let doc: Testimonial = new_document(json!({
            "name": name,
            "company": "Gulf Builders",
            "rating": 4,
            "text": "Good work",
            "approved": approved,
        }))
        .unwrap();
        store.insert(doc).await.unwrap();
    }

    let public = store.list(&Filter::eq("approved", true)).await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].name, "A");
    assert!(store.get("6553a1f0c2b4e81a9f0d1234").await.unwrap().is_none());
}
