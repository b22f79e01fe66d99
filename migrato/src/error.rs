use migrato_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("version {0} not found")]
    VersionNotFound(String),

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("registry `{0}`")]
    Registry(#[source] StoreError),

    #[error("failed to migrate project `{project}` after {processed} projects: {source}")]
    Migration {
        project: String,
        processed: u64,
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid cache pattern `{0}`")]
    Pattern(String),

    #[error("cache unavailable `{0}`")]
    Unavailable(String),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}
