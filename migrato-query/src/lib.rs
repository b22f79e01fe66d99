#![forbid(unsafe_code)]
mod error;
mod query;

pub use error::QueryError;
pub use query::*;
