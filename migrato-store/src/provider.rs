use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::{document::Document, engine::Database, error::Result};

#[cfg(feature = "memory")]
use crate::engine::MemoryDatabase;
#[cfg(feature = "pg")]
use crate::engine::PgDatabase;

/// Namespace holding the tables of one project: `_<internal id>`.
pub fn project_namespace(project: &Document) -> String {
    format!("_{}", project.internal_id)
}

/// Resolves the database of one project.
#[async_trait]
pub trait ProjectDatabaseProvider: DynClone + Send + Sync {
    async fn get(&self, project: &'_ Document) -> Result<Database>;
}

dyn_clone::clone_trait_object!(ProjectDatabaseProvider);

#[cfg(feature = "memory")]
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    engine: MemoryDatabase,
}

#[cfg(feature = "memory")]
impl MemoryProvider {
    /// Project databases share their storage with `engine`, so a registry
    /// built from the same engine sees the root project's tables.
    pub fn new(engine: &MemoryDatabase) -> Self {
        Self {
            engine: engine.clone(),
        }
    }
}

#[cfg(feature = "memory")]
#[async_trait]
impl ProjectDatabaseProvider for MemoryProvider {
    async fn get(&self, project: &'_ Document) -> Result<Database> {
        Ok(self.engine.scoped(project_namespace(project)).database())
    }
}

#[cfg(feature = "pg")]
#[derive(Debug, Clone)]
pub struct PgProvider {
    pool: sqlx::PgPool,
}

#[cfg(feature = "pg")]
impl PgProvider {
    pub fn new(pool: &sqlx::PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[cfg(feature = "pg")]
#[async_trait]
impl ProjectDatabaseProvider for PgProvider {
    async fn get(&self, project: &'_ Document) -> Result<Database> {
        Ok(PgDatabase::with_namespace(
            &self.pool,
            project_namespace(project),
        ))
    }
}
