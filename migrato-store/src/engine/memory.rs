use async_trait::async_trait;
use chrono::Utc;
use migrato_query::{paginate, Page, PageArgs};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

use crate::{
    authorization::Authorization,
    document::Document,
    engine::{Database, Engine},
    error::{Result, StoreError},
};

type Collections = HashMap<String, Vec<Document>>;

#[derive(Debug, Default)]
struct Namespaces {
    namespaces: HashMap<String, Collections>,
    sequence: u64,
}

/// In-memory engine. Clones share both the data and the selected namespace;
/// [`MemoryDatabase::scoped`] shares only the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    data: Arc<RwLock<Namespaces>>,
    namespace: Arc<RwLock<Option<String>>>,
}

impl MemoryDatabase {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Database {
        Database::new(Self::default())
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Database {
        Database::new(Self::create().scoped(namespace))
    }

    pub fn create() -> Self {
        Self::default()
    }

    pub fn scoped(&self, namespace: impl Into<String>) -> Self {
        Self {
            data: self.data.clone(),
            namespace: Arc::new(RwLock::new(Some(namespace.into()))),
        }
    }

    pub fn database(&self) -> Database {
        Database::new(self.clone())
    }

    fn current_namespace(&self) -> Result<String> {
        self.namespace
            .read()
            .clone()
            .ok_or(StoreError::NamespaceNotSet)
    }

    fn readable(&self, auth: &Authorization, collection: &str) -> Result<Vec<Document>> {
        let namespace = self.current_namespace()?;
        let data = self.data.read();

        let documents = data
            .namespaces
            .get(&namespace)
            .and_then(|collections| collections.get(collection))
            .ok_or_else(|| StoreError::CollectionNotFound(format!("{namespace}_{collection}")))?;

        Ok(documents
            .iter()
            .filter(|document| auth.can_read(document))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Engine for MemoryDatabase {
    fn namespace(&self) -> Option<String> {
        self.namespace.read().clone()
    }

    fn set_namespace(&self, namespace: &str) {
        *self.namespace.write() = Some(namespace.to_owned());
    }

    async fn create_collection(&self, collection: &'_ str) -> Result<()> {
        let namespace = self.current_namespace()?;

        self.data
            .write()
            .namespaces
            .entry(namespace)
            .or_default()
            .entry(collection.to_owned())
            .or_default();

        Ok(())
    }

    async fn count(&self, auth: &'_ Authorization, collection: &'_ str) -> Result<u64> {
        let documents = self.readable(auth, collection)?;

        Ok(documents.len() as u64)
    }

    async fn find(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        args: PageArgs,
    ) -> Result<Page<Document>> {
        let documents = self.readable(auth, collection)?;

        Ok(paginate(&documents, args)?)
    }

    async fn get(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        id: &'_ str,
    ) -> Result<Option<Document>> {
        let documents = self.readable(auth, collection)?;

        Ok(documents.into_iter().find(|document| document.id == id))
    }

    async fn upsert(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        mut document: Document,
    ) -> Result<Document> {
        let namespace = self.current_namespace()?;
        let mut data = self.data.write();
        let Namespaces {
            namespaces,
            sequence,
        } = &mut *data;

        let documents = namespaces
            .get_mut(&namespace)
            .and_then(|collections| collections.get_mut(collection))
            .ok_or_else(|| StoreError::CollectionNotFound(format!("{namespace}_{collection}")))?;

        if let Some(existing) = documents.iter_mut().find(|d| d.id == document.id) {
            if !auth.can_read(existing) {
                return Err(StoreError::Unauthorized(document.id));
            }

            existing.read = document.read;
            existing.data = document.data;
            existing.updated_at = Utc::now();

            return Ok(existing.clone());
        }

        *sequence += 1;

        if document.internal_id.is_empty() {
            document.internal_id = sequence.to_string();
        }

        documents.push(document.clone());

        Ok(document)
    }
}
