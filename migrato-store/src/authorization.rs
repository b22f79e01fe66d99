use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Permission context handed to every [`Database`](crate::Database) read and
/// write.
///
/// A regular context only sees documents whose `read` list is empty or
/// shares a role with it. A skipped context sees everything; it is meant for
/// maintenance jobs and lives exactly as long as the value that holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    skip: bool,
    roles: Vec<String>,
}

impl Authorization {
    pub fn new<R: Into<String>>(roles: impl IntoIterator<Item = R>) -> Self {
        Self {
            skip: false,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn skip() -> Self {
        Self {
            skip: true,
            roles: Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn can_read(&self, document: &Document) -> bool {
        self.skip
            || document.read.is_empty()
            || document.read.iter().any(|role| self.roles.contains(role))
    }
}
