pub mod m1_0_0;
pub mod m1_1_0;
pub mod m1_2_0;

use async_trait::async_trait;
use chrono::Utc;
use migrato_store::{
    project_namespace, Authorization, Database, Document, RawConnection,
};
use serde_json::json;

/// Collection of every project database recording which version it is on.
pub const METADATA_COLLECTION: &str = "metadata";

/// Id of the metadata document holding the version.
pub const VERSION_DOCUMENT: &str = "version";

/// A migration bound to one project.
///
/// `execute` is called exactly once. Implementations must be idempotent so
/// that a failed batch can simply be run again.
#[async_trait]
pub trait MigrationUnit: Send {
    fn version(&self) -> &'static str;

    async fn execute(&mut self) -> anyhow::Result<()>;
}

/// Everything a unit may touch while migrating one project.
pub struct MigrationBinding {
    pub project: Document,
    pub project_db: Database,
    pub registry_db: Database,
    pub connection: Box<dyn RawConnection>,
    pub auth: Authorization,
    pub projects_collection: String,
}

impl MigrationBinding {
    pub fn namespace(&self) -> String {
        project_namespace(&self.project)
    }

    /// Quoted name of a project table.
    pub fn table(&self, collection: &str) -> String {
        format!("\"{}_{collection}\"", self.namespace())
    }

    pub async fn execute(&mut self, statement: &str) -> anyhow::Result<u64> {
        tracing::debug!(project = %self.project.id, "{statement}");

        Ok(self.connection.execute(statement).await?)
    }

    pub async fn ensure_metadata(&self) -> anyhow::Result<()> {
        self.project_db
            .create_collection(METADATA_COLLECTION)
            .await?;

        Ok(())
    }

    pub async fn stamp_version(&self, version: &str) -> anyhow::Result<Document> {
        let document = Document::new(VERSION_DOCUMENT).data(json!({
            "version": version,
            "migrated_at": Utc::now(),
        }))?;

        Ok(self
            .project_db
            .upsert_document(&self.auth, METADATA_COLLECTION, document)
            .await?)
    }

    /// Records the version on the project's registry entry. The root project
    /// has no entry, and an entry sharing its id but not its internal id
    /// belongs to someone else.
    pub async fn update_project_version(&self, version: &str) -> anyhow::Result<()> {
        let Some(mut document) = self
            .registry_db
            .get_document(&self.auth, &self.projects_collection, &self.project.id)
            .await?
        else {
            return Ok(());
        };

        if document.internal_id != self.project.internal_id {
            return Ok(());
        }

        document.set("version", version)?;

        self.registry_db
            .upsert_document(&self.auth, &self.projects_collection, document)
            .await?;

        Ok(())
    }
}
