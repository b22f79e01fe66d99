use async_trait::async_trait;

use super::{MigrationBinding, MigrationUnit, METADATA_COLLECTION};

pub const VERSION: &str = "1.1.0";

/// Adds a `search` column to the metadata table and fills it from `data`.
pub struct Migration {
    binding: MigrationBinding,
    rows: u64,
}

impl Migration {
    pub fn new(binding: MigrationBinding) -> Self {
        Self { binding, rows: 0 }
    }
}

#[async_trait]
impl MigrationUnit for Migration {
    fn version(&self) -> &'static str {
        VERSION
    }

    async fn execute(&mut self) -> anyhow::Result<()> {
        self.binding.ensure_metadata().await?;

        let table = self.binding.table(METADATA_COLLECTION);

        self.binding
            .execute(&format!(
                "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS search TEXT"
            ))
            .await?;

        self.rows += self
            .binding
            .execute(&format!(
                "UPDATE {table} SET search = id || ' ' || data::text WHERE search IS NULL"
            ))
            .await?;

        self.binding.stamp_version(VERSION).await?;
        self.binding.update_project_version(VERSION).await?;

        tracing::debug!(project = %self.binding.project.id, rows = self.rows, "search column filled");

        Ok(())
    }
}
