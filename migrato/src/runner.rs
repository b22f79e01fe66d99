use chrono::{DateTime, Utc};
use migrato_store::{
    Authorization, ConnectionPool, Database, Document, PageArgs, ProjectDatabaseProvider,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    cache::{Cache, CacheInvalidator},
    catalog::{MigrationTarget, VersionCatalog},
    config::MigrateConfig,
    error::{MigrateError, Result},
    migration::MigrationBinding,
    source::ProjectPageSource,
};

/// Progress of a run, replaced after every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub processed: u64,
    pub total: u64,
    pub offset: u64,
    pub page_size: u16,
}

impl RunState {
    pub fn new(total: u64, page_size: u16) -> Self {
        Self {
            processed: 0,
            total,
            offset: 0,
            page_size,
        }
    }

    /// Registry page to fetch next.
    pub fn page_args(&self) -> PageArgs {
        PageArgs::new(self.page_size, self.offset)
    }

    /// State after a page of `completed` projects. Skipped projects count as
    /// processed.
    pub fn advance(self, completed: usize) -> Self {
        Self {
            processed: self.processed + completed as u64,
            offset: self.offset + u64::from(self.page_size),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub version: String,
    pub processed: u64,
    pub total: u64,
    pub pages_fetched: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Phases after the version is validated and the run initialized. Aborting
/// is the error path out of the loop.
enum RunPhase {
    ProcessingPage(Vec<Document>),
    Reporting(Vec<Document>),
    Done,
}

struct Run {
    target: MigrationTarget,
    auth: Authorization,
    invalidator: CacheInvalidator,
}

/// Migrates every project to one version, root project first, one project at
/// a time. The first failure stops the whole batch.
#[derive(Clone)]
pub struct MigrationRunner {
    catalog: VersionCatalog,
    config: MigrateConfig,
    registry: Database,
    provider: Box<dyn ProjectDatabaseProvider>,
    pool: Box<dyn ConnectionPool>,
    cache: Box<dyn Cache>,
}

impl MigrationRunner {
    pub fn new<P, C, K>(registry: Database, provider: P, pool: C, cache: K) -> Self
    where
        P: ProjectDatabaseProvider + 'static,
        C: ConnectionPool + 'static,
        K: Cache + 'static,
    {
        Self {
            catalog: VersionCatalog::default(),
            config: MigrateConfig::default(),
            registry,
            provider: Box::new(provider),
            pool: Box::new(pool),
            cache: Box::new(cache),
        }
    }

    pub fn catalog(mut self, catalog: VersionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(mut self, config: MigrateConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn run(&self, version: &str) -> Result<RunReport> {
        let started_at = Utc::now();

        let target = match self.catalog.resolve(version) {
            Ok(target) => target,
            Err(e) => {
                error!("Version {version} not found.");
                return Err(e);
            }
        };

        if PageArgs::first(self.config.page_size).validate().is_err() {
            error!("Invalid page size {}.", self.config.page_size);
            return Err(MigrateError::InvalidPageSize);
        }

        info!("Starting data migration to version {}", target.version);

        let run = Run {
            target,
            auth: Authorization::skip(),
            invalidator: CacheInvalidator::from_boxed(
                self.cache.clone(),
                &self.config.cache_key_prefix,
            ),
        };

        let result = self.run_pages(&run, started_at).await;

        if let Err(e) = &result {
            error!("Data migration to version {} failed: {e}", run.target.version);
        }

        result
    }

    async fn run_pages(&self, run: &Run, started_at: DateTime<Utc>) -> Result<RunReport> {
        let mut source =
            ProjectPageSource::new(self.registry.clone(), run.auth.clone(), self.config.clone());

        let total = source.total().await?;
        let mut state = RunState::new(total, self.config.page_size);
        let mut phase = RunPhase::ProcessingPage(source.first_page());

        loop {
            phase = match phase {
                RunPhase::ProcessingPage(page) => {
                    self.process_page(run, &page, &state).await?;

                    let next = source.next_page(state.page_args()).await?;
                    state = state.advance(page.len());

                    RunPhase::Reporting(next)
                }
                RunPhase::Reporting(page) => {
                    info!("Migrated {}/{} projects...", state.processed, state.total);

                    if page.is_empty() {
                        RunPhase::Done
                    } else {
                        RunPhase::ProcessingPage(page)
                    }
                }
                RunPhase::Done => {
                    info!("Data migration completed");

                    return Ok(RunReport {
                        version: run.target.version.to_owned(),
                        processed: state.processed,
                        total: state.total,
                        pages_fetched: source.fetched(),
                        started_at,
                        completed_at: Utc::now(),
                    });
                }
            };
        }
    }

    async fn process_page(&self, run: &Run, page: &[Document], state: &RunState) -> Result<()> {
        for project in page {
            if self.config.is_root_impostor(project) {
                debug!(
                    "skipping project {} ({}) reusing the root project id",
                    project.id, project.internal_id
                );
                continue;
            }

            run.invalidator.purge(project).await;

            if let Err(e) = self.migrate_project(run, project).await {
                error!(
                    "Failed to update project (\"{}\") version with error: {e}",
                    project.id
                );

                return Err(MigrateError::Migration {
                    project: project.id.to_owned(),
                    processed: state.processed,
                    source: e,
                });
            }

            run.invalidator.purge(project).await;
        }

        Ok(())
    }

    async fn migrate_project(&self, run: &Run, project: &Document) -> anyhow::Result<()> {
        let project_db = self.provider.get(project).await?;
        let connection = self.pool.acquire().await?;

        let mut unit = run.target.bind(MigrationBinding {
            project: project.clone(),
            project_db,
            registry_db: self.registry.clone(),
            connection,
            auth: run.auth.clone(),
            projects_collection: self.config.projects_collection.to_owned(),
        });

        debug!(project = %project.id, version = unit.version(), "migrating");

        unit.execute().await
    }
}
