use async_trait::async_trait;
use dyn_clone::DynClone;
use glob_match::glob_match;
use migrato_store::Document;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::error;

use crate::{config::CACHE_KEY_PREFIX, error::CacheError};

#[async_trait]
pub trait Cache: DynClone + Send + Sync {
    async fn save(&self, key: &'_ str, value: String) -> Result<(), CacheError>;

    async fn load(&self, key: &'_ str) -> Result<Option<String>, CacheError>;

    /// Removes every key matching the glob `pattern` and returns how many
    /// were removed.
    async fn purge(&self, pattern: &'_ str) -> Result<u64, CacheError>;
}

dyn_clone::clone_trait_object!(Cache);

#[derive(Debug, Clone, Default)]
pub struct MemoryCache(Arc<RwLock<HashMap<String, String>>>);

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.0.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn save(&self, key: &'_ str, value: String) -> Result<(), CacheError> {
        self.0.write().insert(key.to_owned(), value);

        Ok(())
    }

    async fn load(&self, key: &'_ str) -> Result<Option<String>, CacheError> {
        Ok(self.0.read().get(key).cloned())
    }

    async fn purge(&self, pattern: &'_ str) -> Result<u64, CacheError> {
        if pattern.trim().is_empty() {
            return Err(CacheError::Pattern(pattern.to_owned()));
        }

        let mut entries = self.0.write();
        let before = entries.len();

        entries.retain(|key, _| !glob_match(pattern, key));

        Ok((before - entries.len()) as u64)
    }
}

/// Drops the cached entries of one project.
///
/// Purging is best effort: errors are logged and never reach the caller.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Box<dyn Cache>,
    prefix: String,
}

impl CacheInvalidator {
    pub fn new<C: Cache + 'static>(cache: C) -> Self {
        Self::with_prefix(cache, CACHE_KEY_PREFIX)
    }

    pub fn with_prefix<C: Cache + 'static>(cache: C, prefix: impl Into<String>) -> Self {
        Self::from_boxed(Box::new(cache), prefix)
    }

    pub(crate) fn from_boxed(cache: Box<dyn Cache>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn pattern(&self, project: &Document) -> String {
        format!("{}{}:*", self.prefix, project.internal_id)
    }

    pub async fn purge(&self, project: &Document) {
        let pattern = self.pattern(project);

        match self.cache.purge(&pattern).await {
            Ok(removed) => {
                tracing::debug!(project = %project.id, removed, "cache purged");
            }
            Err(e) => {
                error!(
                    "Failed to clear project (\"{}\") cache with error: {e}",
                    project.id
                );
            }
        }
    }
}
