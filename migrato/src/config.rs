//! Configuration constants and defaults for a migration run

use migrato_store::Document;

/// Number of projects fetched from the registry per page
pub const PAGE_SIZE: u16 = 30;

/// External and internal id of the root project
///
/// The root project holds the platform's own data. It is not stored in the
/// projects collection, so the runner synthesises it and migrates it first.
pub const ROOT_PROJECT_ID: &str = "console";

/// Namespace the registry falls back to when counting projects fails
pub const ROOT_NAMESPACE: &str = "_console";

/// Collection of the registry listing every project
pub const PROJECTS_COLLECTION: &str = "projects";

/// Cache keys of a project start with this prefix followed by its internal id
pub const CACHE_KEY_PREFIX: &str = "cache-_";

/// Longest accepted version identifier
pub const MAX_VERSION_LEN: usize = 8;

/// Version migrated to when none is given
pub const APP_VERSION_STABLE: &str = "1.2.0";

/// Settings of one migration run
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// Projects per registry page
    pub page_size: u16,

    /// Reserved id of the root project
    pub root_project_id: String,

    /// Registry namespace used for the single count retry
    pub fallback_namespace: String,

    /// Registry collection holding the projects
    pub projects_collection: String,

    /// Prefix of every project cache key
    pub cache_key_prefix: String,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            root_project_id: ROOT_PROJECT_ID.to_owned(),
            fallback_namespace: ROOT_NAMESPACE.to_owned(),
            projects_collection: PROJECTS_COLLECTION.to_owned(),
            cache_key_prefix: CACHE_KEY_PREFIX.to_owned(),
        }
    }
}

impl MigrateConfig {
    /// The root project document, whose internal id equals its id.
    pub fn root_project(&self) -> Document {
        Document::with_internal_id(&self.root_project_id, &self.root_project_id)
    }

    /// A user project that reused the reserved id. It is never migrated.
    pub fn is_root_impostor(&self, project: &Document) -> bool {
        project.id == self.root_project_id && project.internal_id != self.root_project_id
    }
}

/// Configuration builder for customizing a migration run
#[derive(Debug)]
pub struct ConfigBuilder {
    config: MigrateConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: MigrateConfig::default(),
        }
    }

    pub fn page_size(mut self, size: u16) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn root_project_id(mut self, id: impl Into<String>) -> Self {
        self.config.root_project_id = id.into();
        self
    }

    pub fn fallback_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.fallback_namespace = namespace.into();
        self
    }

    pub fn projects_collection(mut self, collection: impl Into<String>) -> Self {
        self.config.projects_collection = collection.into();
        self
    }

    pub fn cache_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.cache_key_prefix = prefix.into();
        self
    }

    pub fn build(self) -> MigrateConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
