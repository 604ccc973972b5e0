//! The normalized identity model.
//!
//! A resolver produces one of two identity shapes depending on how it was
//! configured: an identity projected straight out of a directory entry, or
//! an identity carried by a store record that a directory entry was
//! correlated with. The construction strategy is fixed at
//! configuration-load time, so consuming code can match on the variant
//! without re-deriving the configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::store::StoreRecord;

/// A resolved user identity.
///
/// Identities are immutable once constructed and live for one
/// authentication transaction. Every identity carries exactly one stable
/// identifier, reachable through [`Identity::id`] regardless of variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Identity {
    /// Built purely from a directory entry.
    Directory(DirectoryIdentity),
    /// Built from a store record, optionally correlated with a directory
    /// entry.
    Store(StoreIdentity),
}

impl Identity {
    /// Returns the stable identifier, rendered as a string.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Directory(identity) => identity.id().to_string(),
            Self::Store(identity) => scalar_to_string(identity.key()),
        }
    }

    /// Returns a named attribute as a string, if the identity carries it.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        match self {
            Self::Directory(identity) => identity.get(name).map(str::to_owned),
            Self::Store(identity) => identity.record().get(name).map(scalar_to_string),
        }
    }

    /// Returns true if remember-token updates persist for this identity.
    ///
    /// Only full-model store identities carry persistence capability;
    /// for every other shape a token update is a no-op.
    #[must_use]
    pub const fn supports_persistent_tokens(&self) -> bool {
        match self {
            Self::Directory(_) => false,
            Self::Store(identity) => identity.persistent(),
        }
    }
}

/// An identity projected from a directory entry.
///
/// The attribute set is deterministic for a given configuration: the
/// identifier comes from the configured identifier attribute, and each
/// remaining field is the first value of a mapped directory attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryIdentity {
    id: String,
    attributes: BTreeMap<String, String>,
}

impl DirectoryIdentity {
    /// Creates a directory identity.
    #[must_use]
    pub fn new(id: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// The stable identifier value.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a projected attribute by its mapped field name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).map(String::as_str)
    }

    /// The full projected attribute map.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// An identity carried by a store record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreIdentity {
    key: Value,
    record: StoreRecord,
    persistent: bool,
}

impl StoreIdentity {
    /// Creates a store identity.
    ///
    /// `persistent` is true only for fully modeled records that keep their
    /// store's save capability.
    #[must_use]
    pub fn new(key: Value, record: StoreRecord, persistent: bool) -> Self {
        Self {
            key,
            record,
            persistent,
        }
    }

    /// The primary-key value of the underlying record.
    #[must_use]
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// The underlying store record.
    #[must_use]
    pub fn record(&self) -> &StoreRecord {
        &self.record
    }

    /// Whether this identity keeps the store's persistence capability.
    #[must_use]
    pub const fn persistent(&self) -> bool {
        self.persistent
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
