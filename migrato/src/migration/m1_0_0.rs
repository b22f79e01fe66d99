use async_trait::async_trait;

use super::{MigrationBinding, MigrationUnit, METADATA_COLLECTION};

pub const VERSION: &str = "1.0.0";

pub struct Migration {
    binding: MigrationBinding,
}

impl Migration {
    pub fn new(binding: MigrationBinding) -> Self {
        Self { binding }
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
        let index = format!("\"{}_metadata_updated_at\"", self.binding.namespace());

        self.binding
            .execute(&format!(
                "CREATE INDEX IF NOT EXISTS {index} ON {table} (updated_at)"
            ))
            .await?;

        self.binding.stamp_version(VERSION).await?;
        self.binding.update_project_version(VERSION).await?;

        Ok(())
    }
}
