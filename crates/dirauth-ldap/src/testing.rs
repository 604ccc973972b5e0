//! In-memory store fake shared by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use dirauth_core::{Error, Result, StoreRecord, UserStore};

/// An in-memory [`UserStore`] holding a single table of records.
///
/// Records every `set_field` call so tests can assert on token writes.
pub(crate) struct MemoryStore {
    rows: Vec<StoreRecord>,
    writes: Mutex<Vec<(String, Value, String, Value)>>,
    failing: bool,
}

impl MemoryStore {
    pub(crate) fn new(rows: Vec<StoreRecord>) -> Self {
        Self {
            rows,
            writes: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    /// A store whose every operation fails with `Error::Store`.
    pub(crate) fn failing() -> Self {
        Self {
            rows: Vec::new(),
            writes: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub(crate) fn writes(&self) -> Vec<(String, Value, String, Value)> {
        self.writes.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(Error::Store("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_field(
        &self,
        _table: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<StoreRecord>> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .find(|row| row.get_str(field) == Some(value))
            .cloned())
    }

    async fn find_by_key(&self, _table: &str, key: &Value) -> Result<Option<StoreRecord>> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .find(|row| row.get("id") == Some(key))
            .cloned())
    }

    async fn set_field(&self, table: &str, key: &Value, field: &str, value: &Value) -> Result<()> {
        self.check()?;
        self.writes.lock().unwrap().push((
            table.to_string(),
            key.clone(),
            field.to_string(),
            value.clone(),
        ));
        Ok(())
    }
}
