//! The relational store collaborator contract.
//!
//! The resolver treats the secondary store as an opaque point-lookup and
//! save service: it never owns a query engine. Host applications implement
//! [`UserStore`] over whatever connection they already hold, and the
//! resolver only ever asks for single-row lookups by field equality, by
//! primary key, and one atomic field write for remember-token updates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Result;

/// A single row returned by the store collaborator.
///
/// Field values are scalars as the store reported them; a numeric primary
/// key stays numeric. Records are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreRecord {
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl StoreRecord {
    /// Creates a record from a field map.
    #[must_use]
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the value of a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field value as a string slice, if present and textual.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns the full field map.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for StoreRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Point-lookup and save operations the resolver requires from a store.
///
/// Implementations must report their own failures as [`Error::Store`]
/// so they pass through the resolver unmodified.
///
/// [`Error::Store`]: crate::Error::Store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds at most one record in `table` whose `field` equals `value`.
    async fn find_by_field(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<StoreRecord>>;

    /// Finds a record in `table` by its primary key.
    async fn find_by_key(&self, table: &str, key: &Value) -> Result<Option<StoreRecord>>;

    /// Writes a single field of the record identified by `key`.
    ///
    /// Must be one atomic write; the resolver uses it for remember-token
    /// updates only.
    async fn set_field(&self, table: &str, key: &Value, field: &str, value: &Value) -> Result<()>;
}
