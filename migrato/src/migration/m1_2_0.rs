use async_trait::async_trait;
use migrato_store::Document;

use super::{MigrationBinding, MigrationUnit, METADATA_COLLECTION, VERSION_DOCUMENT};

pub const VERSION: &str = "1.2.0";

/// Keeps the versions a project went through in its metadata.
pub struct Migration {
    binding: MigrationBinding,
    previous: Option<String>,
}

impl Migration {
    pub fn new(binding: MigrationBinding) -> Self {
        Self {
            binding,
            previous: None,
        }
    }

    async fn load_previous(&mut self) -> anyhow::Result<()> {
        let current = self
            .binding
            .project_db
            .get_document(&self.binding.auth, METADATA_COLLECTION, VERSION_DOCUMENT)
            .await?;

        self.previous = current
            .as_ref()
            .and_then(|document| document.get_str("version"))
            .map(ToOwned::to_owned);

        Ok(())
    }
}

#[async_trait]
impl MigrationUnit for Migration {
    fn version(&self) -> &'static str {
        VERSION
    }

    async fn execute(&mut self) -> anyhow::Result<()> {
        self.binding.ensure_metadata().await?;
        self.load_previous().await?;

        let history = self
            .binding
            .project_db
            .get_document(&self.binding.auth, METADATA_COLLECTION, "history")
            .await?;

        let mut versions: Vec<String> = history
            .as_ref()
            .and_then(|document| document.get("versions").cloned())
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        for version in self.previous.iter().map(String::as_str).chain([VERSION]) {
            if !versions.iter().any(|v| v == version) {
                versions.push(version.to_owned());
            }
        }

        let mut document = history.unwrap_or_else(|| Document::new("history"));
        document.set("versions", &versions)?;

        self.binding
            .project_db
            .upsert_document(&self.binding.auth, METADATA_COLLECTION, document)
            .await?;

        self.binding.stamp_version(VERSION).await?;
        self.binding.update_project_version(VERSION).await?;

        Ok(())
    }
}
