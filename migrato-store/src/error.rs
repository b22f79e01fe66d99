#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database namespace is not set")]
    NamespaceNotSet,

    #[error("collection `{0}` not found")]
    CollectionNotFound(String),

    #[error("missing read permission on document `{0}`")]
    Unauthorized(String),

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[cfg(feature = "pg")]
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),

    #[error("migrato_query `{0}`")]
    Query(#[from] migrato_query::QueryError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
