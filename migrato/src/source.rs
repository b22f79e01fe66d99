use migrato_store::{Authorization, Database, Document, PageArgs};
use tracing::warn;

use crate::{
    config::MigrateConfig,
    error::{MigrateError, Result},
};

/// Reads the projects to migrate from the registry, one page at a time.
pub struct ProjectPageSource {
    registry: Database,
    auth: Authorization,
    config: MigrateConfig,
    fetched: u64,
}

impl ProjectPageSource {
    pub fn new(registry: Database, auth: Authorization, config: MigrateConfig) -> Self {
        Self {
            registry,
            auth,
            config,
            fetched: 0,
        }
    }

    /// The page processed before any registry page: the root project alone.
    pub fn first_page(&self) -> Vec<Document> {
        vec![self.config.root_project()]
    }

    /// Number of projects of the run, the root project included.
    ///
    /// A failed count is retried exactly once, after switching the registry
    /// to the fallback namespace, whatever the first error was.
    pub async fn total(&self) -> Result<u64> {
        let collection = &self.config.projects_collection;

        let count = match self.registry.count(&self.auth, collection).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    "counting projects failed ({e}), retrying in namespace {}",
                    self.config.fallback_namespace
                );

                self.registry.set_namespace(&self.config.fallback_namespace);
                self.registry
                    .count(&self.auth, collection)
                    .await
                    .map_err(MigrateError::Registry)?
            }
        };

        Ok(count + 1)
    }

    pub async fn next_page(&mut self, args: PageArgs) -> Result<Vec<Document>> {
        self.fetched += 1;

        let page = self
            .registry
            .find(&self.auth, &self.config.projects_collection, args)
            .await
            .map_err(MigrateError::Registry)?;

        Ok(page.into_items())
    }

    /// Registry pages requested so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }
}
