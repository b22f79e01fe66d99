use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::error::Result;

#[cfg(feature = "memory")]
use parking_lot::RwLock;
#[cfg(feature = "memory")]
use std::sync::Arc;

/// A low-level connection for statements that have no [`Database`] method,
/// usually DDL.
///
/// [`Database`]: crate::Database
#[async_trait]
pub trait RawConnection: Send + Sync {
    /// Runs one statement and returns the number of affected rows.
    async fn execute(&mut self, statement: &'_ str) -> Result<u64>;
}

#[async_trait]
pub trait ConnectionPool: DynClone + Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn RawConnection>>;
}

dyn_clone::clone_trait_object!(ConnectionPool);

/// Records statements instead of running them.
#[cfg(feature = "memory")]
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    statements: Arc<RwLock<Vec<String>>>,
    acquired: Arc<RwLock<u64>>,
}

#[cfg(feature = "memory")]
impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.read().clone()
    }

    pub fn acquired(&self) -> u64 {
        *self.acquired.read()
    }
}

#[cfg(feature = "memory")]
#[derive(Debug)]
pub struct MemoryConnection {
    statements: Arc<RwLock<Vec<String>>>,
}

#[cfg(feature = "memory")]
#[async_trait]
impl RawConnection for MemoryConnection {
    async fn execute(&mut self, statement: &'_ str) -> Result<u64> {
        self.statements.write().push(statement.to_owned());

        Ok(0)
    }
}

#[cfg(feature = "memory")]
#[async_trait]
impl ConnectionPool for MemoryPool {
    async fn acquire(&self) -> Result<Box<dyn RawConnection>> {
        *self.acquired.write() += 1;

        Ok(Box::new(MemoryConnection {
            statements: self.statements.clone(),
        }))
    }
}

#[cfg(feature = "pg")]
#[derive(Debug, Clone)]
pub struct PgConnectionPool {
    pool: sqlx::PgPool,
}

#[cfg(feature = "pg")]
impl PgConnectionPool {
    pub fn new(pool: &sqlx::PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[cfg(feature = "pg")]
pub struct PgConnection(sqlx::pool::PoolConnection<sqlx::Postgres>);

#[cfg(feature = "pg")]
#[async_trait]
impl RawConnection for PgConnection {
    async fn execute(&mut self, statement: &'_ str) -> Result<u64> {
        let result = sqlx::query(statement).execute(&mut *self.0).await?;

        Ok(result.rows_affected())
    }
}

#[cfg(feature = "pg")]
#[async_trait]
impl ConnectionPool for PgConnectionPool {
    async fn acquire(&self) -> Result<Box<dyn RawConnection>> {
        Ok(Box::new(PgConnection(self.pool.acquire().await?)))
    }
}
