#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::QueryError;

#[cfg(feature = "pg")]
mod pg;
#[cfg(feature = "pg")]
pub use pg::*;

/// Default number of items per page when none is given.
pub const DEFAULT_LIMIT: u16 = 25;

/// Row types that can be listed in a stable order.
///
/// `keys` are the columns (or fields) the rows are ordered by, most
/// significant first. The order must be total, otherwise offset pages may
/// skip or repeat rows.
pub trait Sortable {
    fn keys() -> Vec<&'static str>;

    fn to_order_by() -> String {
        Self::keys()
            .iter()
            .map(|key| format!("{key} ASC"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArgs {
    pub limit: u16,
    pub offset: u64,
}

impl Default for PageArgs {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

impl PageArgs {
    pub fn new(limit: u16, offset: u64) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: u16) -> Self {
        Self::new(limit, 0)
    }

    /// Arguments of the page right after this one.
    pub fn next(&self) -> Self {
        Self::new(self.limit, self.offset + u64::from(self.limit))
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.limit == 0 {
            return Err(QueryError::InvalidLimit);
        }

        Ok(())
    }

    pub fn offset_i64(&self) -> Result<i64, QueryError> {
        i64::try_from(self.offset).map_err(|_| QueryError::OffsetOverflow(self.offset))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<N> {
    pub items: Vec<N>,
    pub args: PageArgs,
}

impl<N> Page<N> {
    pub fn new(items: Vec<N>, args: PageArgs) -> Self {
        Self { items, args }
    }

    pub fn empty(args: PageArgs) -> Self {
        Self::new(Vec::new(), args)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<N> {
        self.items
    }
}

impl<N> IntoIterator for Page<N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Slices an already ordered list the way `LIMIT .. OFFSET ..` would.
pub fn paginate<N: Clone>(rows: &[N], args: PageArgs) -> Result<Page<N>, QueryError> {
    args.validate()?;

    let Ok(start) = usize::try_from(args.offset) else {
        return Ok(Page::empty(args));
    };

    if start >= rows.len() {
        return Ok(Page::empty(args));
    }

    let end = std::cmp::min(rows.len(), start + usize::from(args.limit));

    Ok(Page::new(rows[start..end].to_vec(), args))
}
