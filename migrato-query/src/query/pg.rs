use std::marker::PhantomData;

use sqlx::{postgres::PgRow, Encode, Executor, FromRow, Postgres, QueryBuilder, Type};

use crate::{
    error::QueryError,
    query::{Page, PageArgs, Sortable},
};

/// A builder for constructing PostgreSQL queries with offset pagination.
///
/// The `PgQuery` struct appends a stable `ORDER BY` (taken from the row's
/// [`Sortable`] keys) followed by bound `LIMIT` and `OFFSET` parameters.
///
pub struct PgQuery<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
    O: 'q + std::marker::Send,
    O: 'q + Unpin,
    O: 'q + Sortable,
{
    builder: QueryBuilder<'q, Postgres>,
    phantom: PhantomData<&'q O>,
    args: PageArgs,
}

impl<'q, O> PgQuery<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
    O: 'q + std::marker::Send,
    O: 'q + Unpin,
    O: 'q + Sortable,
{
    /// Creates a new `PgQuery` instance with the provided SQL string.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            builder: QueryBuilder::new(sql),
            phantom: PhantomData,
            args: PageArgs::default(),
        }
    }

    /// Appends raw SQL, typically a `WHERE` clause.
    pub fn push(mut self, sql: impl std::fmt::Display) -> Self {
        self.builder.push(sql);
        self
    }

    /// Appends a bound parameter placeholder and binds the value to it.
    pub fn push_bind<T: 'q + Send + Encode<'q, Postgres> + Type<Postgres>>(
        mut self,
        value: T,
    ) -> Self {
        self.builder.push_bind(value);
        self
    }

    /// Configures the query for the given page.
    pub fn paginate(mut self, args: PageArgs) -> Result<Self, QueryError> {
        args.validate()?;

        let offset = args.offset_i64()?;
        let order = O::to_order_by();

        self.builder.push(format!(" ORDER BY {order} LIMIT "));
        self.builder.push_bind(i64::from(args.limit));
        self.builder.push(" OFFSET ");
        self.builder.push_bind(offset);
        self.args = args;

        Ok(self)
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub async fn fetch_page<'c, E>(mut self, executor: E) -> Result<Page<O>, QueryError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let rows = self
            .builder
            .build_query_as::<O>()
            .fetch_all(executor)
            .await?;

        Ok(Page::new(rows, self.args))
    }
}
