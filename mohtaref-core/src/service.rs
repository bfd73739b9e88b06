use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SiteError;

/// Standard service methods.
///
/// `Update` is a partial update (fields absent from the payload keep their
/// stored value). `Upsert` creates or updates a document keyed by a unique
/// field. Custom methods are declared via `Custom("methodName")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Remove,
    Upsert,
    Custom(&'static str),
}

impl ServiceMethodKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Remove => "remove",
            ServiceMethodKind::Upsert => "upsert",
            ServiceMethodKind::Custom(name) => *name,
        }
    }

    /// Methods that mutate stored documents.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ServiceMethodKind::Create
                | ServiceMethodKind::Update
                | ServiceMethodKind::Remove
                | ServiceMethodKind::Upsert
        )
    }
}

/// Capabilities describe which methods a service exposes.
///
/// The REST adapter mounts only the routes allowed here.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    /// find, get, create, update, remove
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn with(mut self, method: ServiceMethodKind) -> Self {
        if !self.allows(&method) {
            self.allowed_methods.push(method);
        }
        self
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }
}

fn not_implemented(method: &str) -> anyhow::Error {
    SiteError::not_implemented(format!("Method not implemented: {method}")).into_anyhow()
}

/// Content service trait.
///
/// - `find`   → list documents visible to the caller
/// - `get`    → fetch one by id
/// - `create` → create one from raw JSON fields
/// - `update` → merge JSON fields onto a stored document
/// - `remove` → delete one, returning the removed document
/// - `upsert` → create or update by the collection's unique key
///
/// Write payloads arrive as JSON so that each collection can apply its own
/// defaults and validation before anything is stored.
///
/// Every method defaults to "Method not implemented", so a service
/// overrides only what it supports.
#[async_trait]
pub trait ContentService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _params: P) -> Result<Vec<R>> {
        Err(not_implemented("find"))
    }

    async fn get(&self, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented("get"))
    }

    async fn create(&self, _data: Value, _params: P) -> Result<R> {
        Err(not_implemented("create"))
    }

    async fn update(&self, _id: &str, _data: Value, _params: P) -> Result<R> {
        Err(not_implemented("update"))
    }

    async fn remove(&self, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented("remove"))
    }

    async fn upsert(&self, _data: Value, _params: P) -> Result<R> {
        Err(not_implemented("upsert"))
    }

    /// Non-CRUD operations (e.g. thumbnail generation).
    async fn custom(
        &self,
        method: &str,
        _id: Option<&str>,
        _data: Option<Value>,
        _params: P,
    ) -> Result<Value> {
        Err(not_implemented(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    struct Empty;

    #[async_trait]
    impl ContentService<Value> for Empty {}

    #[tokio::test]
    async fn default_methods_report_not_implemented() {
        let err = Empty.find(()).await.unwrap_err();
        assert_eq!(SiteError::kind_of(&err), ErrorKind::NotImplemented);

        let err = Empty.custom("thumbnail", Some("x"), None, ()).await.unwrap_err();
        assert!(err.to_string().contains("thumbnail"));
    }

    #[test]
    fn capabilities_deduplicate_added_methods() {
        let caps = ServiceCapabilities::standard_crud()
            .with(ServiceMethodKind::Upsert)
            .with(ServiceMethodKind::Upsert);

        assert!(caps.allows(&ServiceMethodKind::Upsert));
        assert_eq!(caps.allowed_methods.len(), 6);
        assert!(!caps.allows(&ServiceMethodKind::Custom("thumbnail")));
    }
}
