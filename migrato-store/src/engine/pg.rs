use async_trait::async_trait;
use chrono::Utc;
use migrato_query::{Page, PageArgs, PgQuery};
use parking_lot::RwLock;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    authorization::Authorization,
    document::Document,
    engine::{identifier, Database, Engine},
    error::{Result, StoreError},
};

const COLUMNS: &str = "id, internal_id, read, data, created_at, updated_at";

/// Postgres engine: collection `c` of namespace `n` is the table `"n_c"`.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
    namespace: Arc<RwLock<Option<String>>>,
}

impl PgDatabase {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(pool: &PgPool) -> Database {
        Database::new(Self::create(pool, None))
    }

    pub fn with_namespace(pool: &PgPool, namespace: impl Into<String>) -> Database {
        Database::new(Self::create(pool, Some(namespace.into())))
    }

    fn create(pool: &PgPool, namespace: Option<String>) -> Self {
        Self {
            pool: pool.clone(),
            namespace: Arc::new(RwLock::new(namespace)),
        }
    }

    pub fn table(&self, collection: &str) -> Result<String> {
        let namespace = self
            .namespace
            .read()
            .clone()
            .ok_or(StoreError::NamespaceNotSet)?;

        let table = format!("{}_{}", identifier(&namespace)?, identifier(collection)?);

        Ok(format!("\"{table}\""))
    }
}

#[async_trait]
impl Engine for PgDatabase {
    fn namespace(&self) -> Option<String> {
        self.namespace.read().clone()
    }

    fn set_namespace(&self, namespace: &str) {
        *self.namespace.write() = Some(namespace.to_owned());
    }

    async fn create_collection(&self, collection: &'_ str) -> Result<()> {
        let table = self.table(collection)?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq BIGSERIAL PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                internal_id TEXT NOT NULL UNIQUE,
                read TEXT[] NOT NULL DEFAULT '{{}}',
                data JSONB NOT NULL DEFAULT '{{}}',
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self, auth: &'_ Authorization, collection: &'_ str) -> Result<u64> {
        let table = self.table(collection)?;

        let count: i64 = if auth.is_skipped() {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {table} WHERE cardinality(read) = 0 OR read && $1"
            ))
            .bind(auth.roles().to_vec())
            .fetch_one(&self.pool)
            .await?
        };

        Ok(u64::try_from(count).map_err(anyhow::Error::from)?)
    }

    async fn find(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        args: PageArgs,
    ) -> Result<Page<Document>> {
        let table = self.table(collection)?;
        let query = PgQuery::<Document>::new(format!("SELECT {COLUMNS} FROM {table}"));

        let query = if auth.is_skipped() {
            query
        } else {
            query
                .push(" WHERE cardinality(read) = 0 OR read && ")
                .push_bind(auth.roles().to_vec())
        };

        Ok(query.paginate(args)?.fetch_page(&self.pool).await?)
    }

    async fn get(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        id: &'_ str,
    ) -> Result<Option<Document>> {
        let table = self.table(collection)?;

        let document =
            sqlx::query_as::<_, Document>(&format!("SELECT {COLUMNS} FROM {table} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(document.filter(|document| auth.can_read(document)))
    }

    async fn upsert(
        &self,
        auth: &'_ Authorization,
        collection: &'_ str,
        document: Document,
    ) -> Result<Document> {
        let table = self.table(collection)?;
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Document>(&format!(
                "SELECT {COLUMNS} FROM {table} WHERE id = $1 FOR UPDATE"
            ))
            .bind(&document.id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(existing) = existing {
            if !auth.can_read(&existing) {
                tx.rollback().await?;

                return Err(StoreError::Unauthorized(document.id));
            }
        }

        let saved = sqlx::query_as::<_, Document>(&format!(
            r#"
            WITH next AS (
                SELECT nextval(pg_get_serial_sequence('{table}', 'seq')) AS seq
            )
            INSERT INTO {table} (seq, id, internal_id, read, data, created_at, updated_at)
            SELECT next.seq, $1, COALESCE(NULLIF($2, ''), next.seq::text), $3, $4, $5, $5
            FROM next
            ON CONFLICT (id) DO UPDATE
            SET read = EXCLUDED.read, data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&document.id)
        .bind(&document.internal_id)
        .bind(&document.read)
        .bind(&document.data)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(saved)
    }
}
