use async_trait::async_trait;
use dyn_clone::DynClone;
use migrato_query::{Page, PageArgs};

use crate::{
    authorization::Authorization,
    document::Document,
    error::{Result, StoreError},
};

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "pg")]
mod pg;

#[cfg(feature = "memory")]
pub use memory::*;
#[cfg(feature = "pg")]
pub use pg::*;

/// Storage backend of a [`Database`] handle.
///
/// Every collection lives inside a namespace. Engines must fail with
/// [`StoreError::NamespaceNotSet`] when no namespace is selected and must list
/// documents in insertion order.
#[async_trait]
pub trait Engine: DynClone + Send + Sync {
    fn namespace(&self) -> Option<String>;

    fn set_namespace(&self, namespace: &str);

    async fn create_collection(&self, collection: &'_ str) -> Result<()>;

    async fn count(&self, auth: &'_ Authorization, collection: &'_ str) -> Result<u64>;

    async fn find(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        args: PageArgs,
    ) -> Result<Page<Document>>;

    async fn get(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        id: &'_ str,
    ) -> Result<Option<Document>>;

    async fn upsert(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        document: Document,
    ) -> Result<Document>;
}

dyn_clone::clone_trait_object!(Engine);

#[derive(Clone)]
pub struct Database {
    pub(crate) engine: Box<dyn Engine>,
}

impl Database {
    pub fn new<E: Engine + 'static>(engine: E) -> Self {
        Self {
            engine: Box::new(engine),
        }
    }

    pub fn namespace(&self) -> Option<String> {
        self.engine.namespace()
    }

    pub fn set_namespace(&self, namespace: impl AsRef<str>) {
        self.engine.set_namespace(namespace.as_ref());
    }

    pub async fn create_collection(&self, collection: impl AsRef<str>) -> Result<()> {
        let collection = identifier(collection.as_ref())?;

        self.engine.create_collection(collection).await
    }

    pub async fn count(&self, auth: &Authorization, collection: impl AsRef<str>) -> Result<u64> {
        let collection = identifier(collection.as_ref())?;

        self.engine.count(auth, collection).await
    }

    pub async fn find(
        &self,
        auth: &Authorization,
        collection: impl AsRef<str>,
        args: PageArgs,
    ) -> Result<Page<Document>> {
        let collection = identifier(collection.as_ref())?;
        args.validate()?;

        self.engine.find(auth, collection, args).await
    }

    pub async fn get_document(
        &self,
        auth: &Authorization,
        collection: impl AsRef<str>,
        id: impl AsRef<str>,
    ) -> Result<Option<Document>> {
        let collection = identifier(collection.as_ref())?;

        self.engine.get(auth, collection, id.as_ref()).await
    }

    /// Inserts the document, or replaces the `read`/`data` of the document
    /// with the same `id`. The internal id of an existing document never
    /// changes.
    pub async fn upsert_document(
        &self,
        auth: &Authorization,
        collection: impl AsRef<str>,
        document: Document,
    ) -> Result<Document> {
        let collection = identifier(collection.as_ref())?;

        self.engine.upsert(auth, collection, document).await
    }
}

/// Namespaces and collections end up in table names.
pub(crate) fn identifier(value: &str) -> Result<&str> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid {
        return Err(StoreError::InvalidIdentifier(value.to_owned()));
    }

    Ok(value)
}
