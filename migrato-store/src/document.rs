use chrono::{DateTime, Utc};
use migrato_query::Sortable;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A record of a collection: a tenant in the registry's `projects`
/// collection, or any row of a tenant database.
///
/// `id` is the stable external identifier chosen by whoever created the
/// record; `internal_id` is assigned by the storage engine and may differ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "pg", derive(sqlx::FromRow))]
pub struct Document {
    pub id: String,
    pub internal_id: String,
    pub read: Vec<String>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// A document whose internal id is known up front instead of being
    /// assigned on insert.
    pub fn with_internal_id(id: impl Into<String>, internal_id: impl Into<String>) -> Self {
        Self {
            internal_id: internal_id.into(),
            ..Self::new(id)
        }
    }

    /// Restricts reads to the given roles. An empty list means anyone.
    pub fn read<R: Into<String>>(mut self, roles: impl IntoIterator<Item = R>) -> Self {
        self.read = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn data<D: Serialize>(mut self, value: D) -> Result<Self> {
        self.data = serde_json::to_value(&value)?;

        Ok(self)
    }

    pub fn to_data<D: DeserializeOwned>(&self) -> Result<D> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_object().and_then(|data| data.get(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Sets one attribute, turning `data` into an object if it was not one.
    pub fn set<V: Serialize>(&mut self, key: impl Into<String>, value: V) -> Result<()> {
        let value = serde_json::to_value(&value)?;

        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }

        if let Value::Object(data) = &mut self.data {
            data.insert(key.into(), value);
        }

        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        let now = Utc::now();

        Self {
            id: String::default(),
            internal_id: String::default(),
            read: Vec::new(),
            data: Value::Object(Map::new()),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Sortable for Document {
    fn keys() -> Vec<&'static str> {
        vec!["seq"]
    }
}
