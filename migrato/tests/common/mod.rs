#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use migrato::{Cache, CacheError};
use migrato_store::{
    Authorization, Database, Document, Engine, MemoryDatabase, MemoryPool, MemoryProvider, Page,
    PageArgs, ProjectDatabaseProvider, StoreError,
};
use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

pub struct Platform {
    pub engine: MemoryDatabase,
    pub registry: Database,
    pub counter: CountingEngine,
    pub provider: MemoryProvider,
    pub pool: MemoryPool,
    pub cache: RecordingCache,
}

/// A registry in the `_console` namespace holding `project-1..=projects`.
pub async fn platform(projects: usize) -> anyhow::Result<Platform> {
    let engine = MemoryDatabase::create();
    let counter = CountingEngine::new(engine.scoped("_console"));
    let registry = Database::new(counter.clone());

    registry.create_collection("projects").await?;

    for i in 1..=projects {
        add_project(&registry, Document::new(format!("project-{i}"))).await?;
    }

    counter.reset();

    Ok(Platform {
        provider: MemoryProvider::new(&engine),
        engine,
        registry,
        counter,
        pool: MemoryPool::new(),
        cache: RecordingCache::default(),
    })
}

pub async fn add_project(registry: &Database, project: Document) -> anyhow::Result<Document> {
    Ok(registry
        .upsert_document(&Authorization::skip(), "projects", project)
        .await?)
}

/// Counts registry queries.
#[derive(Clone)]
pub struct CountingEngine {
    inner: MemoryDatabase,
    counts: Arc<AtomicU64>,
    finds: Arc<AtomicU64>,
}

impl CountingEngine {
    pub fn new(inner: MemoryDatabase) -> Self {
        Self {
            inner,
            counts: Default::default(),
            finds: Default::default(),
        }
    }

    pub fn counts(&self) -> u64 {
        self.counts.load(Ordering::SeqCst)
    }

    pub fn finds(&self) -> u64 {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.counts.store(0, Ordering::SeqCst);
        self.finds.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Engine for CountingEngine {
    fn namespace(&self) -> Option<String> {
        self.inner.namespace()
    }

    fn set_namespace(&self, namespace: &str) {
        self.inner.set_namespace(namespace);
    }

    async fn create_collection(&self, collection: &str) -> migrato_store::Result<()> {
        self.inner.create_collection(collection).await
    }

    async fn count(&self, auth: &Authorization, collection: &str) -> migrato_store::Result<u64> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count(auth, collection).await
    }

    async fn find(
        &self,
        auth: &Authorization,
        collection: &str,
        args: PageArgs,
    ) -> migrato_store::Result<Page<Document>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(auth, collection, args).await
    }

    async fn get(
        &self,
        auth: &Authorization,
        collection: &str,
        id: &str,
    ) -> migrato_store::Result<Option<Document>> {
        self.inner.get(auth, collection, id).await
    }

    async fn upsert(
        &self,
        auth: &Authorization,
        collection: &str,
        document: Document,
    ) -> migrato_store::Result<Document> {
        self.inner.upsert(auth, collection, document).await
    }
}

/// Records every purge pattern, and optionally fails them all.
#[derive(Clone, Default)]
pub struct RecordingCache {
    patterns: Arc<RwLock<Vec<String>>>,
    fail: bool,
}

impl RecordingCache {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn patterns(&self) -> Vec<String> {
        self.patterns.read().clone()
    }

    pub fn purges_of(&self, internal_id: &str) -> usize {
        let pattern = format!("cache-_{internal_id}:*");

        self.patterns.read().iter().filter(|p| **p == pattern).count()
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn save(&self, _key: &str, _value: String) -> Result<(), CacheError> {
        Ok(())
    }

    async fn load(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn purge(&self, pattern: &str) -> Result<u64, CacheError> {
        self.patterns.write().push(pattern.to_owned());

        if self.fail {
            return Err(CacheError::Unavailable("connection refused".to_owned()));
        }

        Ok(0)
    }
}

/// Fails to open the database of one project.
#[derive(Clone)]
pub struct UnreachableProvider {
    inner: MemoryProvider,
    project: String,
    requested: Arc<RwLock<Vec<String>>>,
}

impl UnreachableProvider {
    pub fn new(inner: MemoryProvider, project: impl Into<String>) -> Self {
        Self {
            inner,
            project: project.into(),
            requested: Default::default(),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.read().clone()
    }
}

#[async_trait]
impl ProjectDatabaseProvider for UnreachableProvider {
    async fn get(&self, project: &Document) -> migrato_store::Result<Database> {
        self.requested.write().push(project.id.to_owned());

        if project.id == self.project {
            return Err(StoreError::Any(anyhow!(
                "database of {} unreachable",
                project.id
            )));
        }

        self.inner.get(project).await
    }
}

/// Hands out a database that rejects every write for one project.
#[derive(Clone)]
pub struct ReadOnlyProvider {
    inner: MemoryProvider,
    project: String,
}

impl ReadOnlyProvider {
    pub fn new(inner: MemoryProvider, project: impl Into<String>) -> Self {
        Self {
            inner,
            project: project.into(),
        }
    }
}

#[async_trait]
impl ProjectDatabaseProvider for ReadOnlyProvider {
    async fn get(&self, project: &Document) -> migrato_store::Result<Database> {
        if project.id == self.project {
            return Ok(Database::new(ReadOnlyEngine));
        }

        self.inner.get(project).await
    }
}

#[derive(Clone)]
struct ReadOnlyEngine;

#[async_trait]
impl Engine for ReadOnlyEngine {
    fn namespace(&self) -> Option<String> {
        Some("_readonly".to_owned())
    }

    fn set_namespace(&self, _namespace: &str) {}

    async fn create_collection(&self, _collection: &str) -> migrato_store::Result<()> {
        Err(StoreError::Any(anyhow!("read-only database")))
    }

    async fn count(&self, _auth: &Authorization, _collection: &str) -> migrato_store::Result<u64> {
        Ok(0)
    }

    async fn find(
        &self,
        _auth: &Authorization,
        _collection: &str,
        args: PageArgs,
    ) -> migrato_store::Result<Page<Document>> {
        Ok(Page::empty(args))
    }

    async fn get(
        &self,
        _auth: &Authorization,
        _collection: &str,
        _id: &str,
    ) -> migrato_store::Result<Option<Document>> {
        Ok(None)
    }

    async fn upsert(
        &self,
        _auth: &Authorization,
        _collection: &str,
        _document: Document,
    ) -> migrato_store::Result<Document> {
        Err(StoreError::Any(anyhow!("read-only database")))
    }
}
