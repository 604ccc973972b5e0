//! Entry-to-identity mapping.
//!
//! Three construction strategies, selected once by configuration: a pure
//! directory projection, a minimal store record correlated with a
//! directory entry, or a fully modeled store record that keeps its
//! persistence capability.

use std::collections::BTreeMap;
use tracing::debug;

use dirauth_core::{DirectoryIdentity, Error, Identity, StoreIdentity, StoreRecord, UserStore};

use crate::client::DirectoryEntry;
use crate::config::{SearchConfig, StoreBridgeConfig};
use crate::Result;

/// Converts raw directory entries and store records into [`Identity`]
/// values according to the search and store-bridge configuration.
#[derive(Debug, Clone)]
pub struct IdentityMapper {
    search: SearchConfig,
    bridge: StoreBridgeConfig,
}

impl IdentityMapper {
    /// Creates a mapper for the given configuration.
    #[must_use]
    pub fn new(search: SearchConfig, bridge: StoreBridgeConfig) -> Self {
        Self { search, bridge }
    }

    /// Builds a directory-derived identity from an entry.
    ///
    /// The identifier is the first value of the configured identifier
    /// attribute; each mapped attribute's first value is projected into
    /// its target field. Mapped attributes absent from the entry are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] when the identifier attribute
    /// is absent, which signals a schema mismatch between configuration
    /// and directory.
    pub fn from_entry(&self, entry: &DirectoryEntry) -> Result<Identity> {
        let id = entry
            .first(self.search.id_attribute())
            .ok_or_else(|| Error::MissingAttribute(self.search.id_attribute().to_string()))?;

        let mut attributes = BTreeMap::new();
        for (source, field) in self.search.attribute_map() {
            if let Some(value) = entry.first(source) {
                attributes.insert(field.clone(), value.to_string());
            }
        }

        Ok(Identity::Directory(DirectoryIdentity::new(id, attributes)))
    }

    /// Builds a store-derived identity from a record.
    ///
    /// In full-model mode the record is reloaded by primary key through
    /// the store, preserving the store's persistence capability; in
    /// minimal mode the raw field set is wrapped with no persistence
    /// capability. Resolves to `None` when a full-model reload finds
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the record lacks the configured
    /// primary-key field, and passes store failures through unmodified.
    pub async fn from_store_record(
        &self,
        record: StoreRecord,
        store: &dyn UserStore,
    ) -> Result<Option<Identity>> {
        let key = record
            .get(self.bridge.key_field())
            .cloned()
            .ok_or_else(|| {
                Error::Store(format!(
                    "store record missing key field `{}`",
                    self.bridge.key_field()
                ))
            })?;

        if self.bridge.full_model() {
            match store.find_by_key(self.bridge.table(), &key).await? {
                Some(full) => Ok(Some(Identity::Store(StoreIdentity::new(key, full, true)))),
                None => {
                    debug!(key = %key, "full-model reload found no record");
                    Ok(None)
                }
            }
        } else {
            Ok(Some(Identity::Store(StoreIdentity::new(
                key, record, false,
            ))))
        }
    }

    /// Correlates a directory entry with a store record and forwards to
    /// [`from_store_record`](Self::from_store_record).
    ///
    /// Reads the configured correlation attribute from the entry and looks
    /// up the record whose configured store field equals it. An absent
    /// correlation attribute or no matching record resolves to `None`.
    ///
    /// # Errors
    ///
    /// Passes store failures through unmodified.
    pub async fn merge_correlated(
        &self,
        entry: &DirectoryEntry,
        store: &dyn UserStore,
    ) -> Result<Option<Identity>> {
        let Some(correlation) = entry.first(self.bridge.directory_attribute()) else {
            debug!(
                attribute = self.bridge.directory_attribute(),
                "entry lacks the correlation attribute"
            );
            return Ok(None);
        };

        match store
            .find_by_field(self.bridge.table(), self.bridge.store_field(), correlation)
            .await?
        {
            Some(record) => self.from_store_record(record, store).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;

    fn search_config() -> SearchConfig {
        SearchConfig::new("ou=people,dc=example,dc=com", "uidNumber", "uid")
            .unwrap()
            .map_attribute("uid", "username")
    }

    fn mapper(bridge: StoreBridgeConfig) -> IdentityMapper {
        IdentityMapper::new(search_config(), bridge)
    }

    fn alice_entry() -> DirectoryEntry {
        let mut attributes = HashMap::new();
        attributes.insert("uid".to_string(), vec!["alice".to_string()]);
        attributes.insert("uidNumber".to_string(), vec!["1001".to_string()]);
        DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=com", attributes)
    }

    fn alice_row() -> StoreRecord {
        [
            ("id".to_string(), json!(7)),
            ("user_name".to_string(), json!("alice")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn entry_round_trip() {
        let identity = mapper(StoreBridgeConfig::disabled())
            .from_entry(&alice_entry())
            .unwrap();

        assert_eq!(identity.id(), "1001");
        assert_eq!(identity.attribute("username").as_deref(), Some("alice"));
        assert!(!identity.supports_persistent_tokens());
    }

    #[test]
    fn entry_missing_identifier_attribute_fails() {
        let mut attributes = HashMap::new();
        attributes.insert("uid".to_string(), vec!["alice".to_string()]);
        let entry = DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=com", attributes);

        let err = mapper(StoreBridgeConfig::disabled())
            .from_entry(&entry)
            .unwrap_err();
        assert_eq!(err, Error::MissingAttribute("uidNumber".to_string()));
    }

    #[test]
    fn entry_skips_unmapped_and_absent_attributes() {
        let config = search_config().map_attribute("mail", "email");
        let mapper = IdentityMapper::new(config, StoreBridgeConfig::disabled());

        let identity = mapper.from_entry(&alice_entry()).unwrap();
        assert_eq!(identity.attribute("username").as_deref(), Some("alice"));
        assert_eq!(identity.attribute("email"), None);
    }

    #[tokio::test]
    async fn minimal_store_record_has_no_persistence() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name").unwrap();
        let store = MemoryStore::new(vec![alice_row()]);

        let identity = mapper(bridge)
            .from_store_record(alice_row(), &store)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(identity.id(), "7");
        assert_eq!(identity.attribute("user_name").as_deref(), Some("alice"));
        assert!(!identity.supports_persistent_tokens());
    }

    #[tokio::test]
    async fn full_model_record_is_reloaded_by_key() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name")
            .unwrap()
            .with_full_model(true);
        let full_row: StoreRecord = [
            ("id".to_string(), json!(7)),
            ("user_name".to_string(), json!("alice")),
            ("email".to_string(), json!("alice@example.com")),
        ]
        .into_iter()
        .collect();
        let store = MemoryStore::new(vec![full_row]);

        let identity = mapper(bridge)
            .from_store_record(alice_row(), &store)
            .await
            .unwrap()
            .unwrap();

        assert!(identity.supports_persistent_tokens());
        assert_eq!(
            identity.attribute("email").as_deref(),
            Some("alice@example.com")
        );
    }

    #[tokio::test]
    async fn full_model_reload_miss_resolves_to_none() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name")
            .unwrap()
            .with_full_model(true);
        let store = MemoryStore::new(Vec::new());

        let identity = mapper(bridge)
            .from_store_record(alice_row(), &store)
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn record_without_key_field_is_a_store_error() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name").unwrap();
        let store = MemoryStore::new(Vec::new());
        let record: StoreRecord = [("user_name".to_string(), json!("alice"))]
            .into_iter()
            .collect();

        let err = mapper(bridge)
            .from_store_record(record, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn merge_correlated_joins_entry_and_record() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name").unwrap();
        let store = MemoryStore::new(vec![alice_row()]);

        let identity = mapper(bridge)
            .merge_correlated(&alice_entry(), &store)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(identity.id(), "7");
        assert_eq!(identity.attribute("user_name").as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn merge_correlated_misses_resolve_to_none() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name").unwrap();

        // No matching store row.
        let store = MemoryStore::new(Vec::new());
        let identity = mapper(bridge.clone())
            .merge_correlated(&alice_entry(), &store)
            .await
            .unwrap();
        assert!(identity.is_none());

        // Entry lacks the correlation attribute.
        let entry = DirectoryEntry::new("cn=ghost,dc=example,dc=com", HashMap::new());
        let store = MemoryStore::new(vec![alice_row()]);
        let identity = mapper(bridge)
            .merge_correlated(&entry, &store)
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn store_failures_pass_through() {
        let bridge = StoreBridgeConfig::new("users", "uid", "user_name").unwrap();
        let store = MemoryStore::failing();

        let err = mapper(bridge)
            .merge_correlated(&alice_entry(), &store)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Store("store offline".to_string()));
    }
}
