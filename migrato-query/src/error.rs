/// Error type representing possible errors that may occur while paginating.
///
/// # Example
///
/// ```rust
/// use migrato_query::{PageArgs, QueryError};
///
/// fn handle_query_error(error: QueryError) {
///     match error {
///         QueryError::InvalidLimit => {
///             // A page must hold at least one item
///         }
///         QueryError::OffsetOverflow(offset) => {
///             // The offset no longer fits the backend's integer type
///         }
///         #[allow(unreachable_patterns)]
///         _ => {}
///     }
/// }
///
/// assert!(PageArgs::new(0, 0).validate().is_err());
/// ```
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// Error variant indicating a page limit of zero.
    #[error("page limit must be greater than zero")]
    InvalidLimit,

    /// Error variant indicating an offset the backend cannot represent.
    #[error("offset `{0}` overflows the backend integer type")]
    OffsetOverflow(u64),

    /// Error variant indicating an SQLx error.
    #[cfg(feature = "pg")]
    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
}
