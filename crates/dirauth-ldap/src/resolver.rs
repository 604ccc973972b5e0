//! Identity resolution orchestration.
//!
//! The resolver composes the filter builder, the directory client, and the
//! identity mapper behind the [`UserProvider`] contract. Zero and
//! more-than-one search results are both treated as absence: the caller
//! cannot safely disambiguate an ambiguous directory, so ambiguity never
//! surfaces as an error.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use dirauth_core::{Credentials, Error, Identity, UserProvider, UserStore};

use crate::client::{DirectoryClient, DirectoryEntry};
use crate::config::{SearchConfig, StoreBridgeConfig};
use crate::dn::DistinguishedName;
use crate::filter;
use crate::mapper::IdentityMapper;
use crate::Result;

/// Resolves and authenticates user identities against the directory,
/// optionally cross-referencing the secondary store.
///
/// Owns one [`DirectoryClient`]; callers needing concurrent authentication
/// throughput run one resolver per worker rather than sharing one
/// mid-transaction.
pub struct IdentityResolver {
    client: DirectoryClient,
    search: SearchConfig,
    bridge: StoreBridgeConfig,
    mapper: IdentityMapper,
    store: Option<Arc<dyn UserStore>>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("search", &self.search)
            .field("bridge", &self.bridge)
            .field("mapper", &self.mapper)
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl IdentityResolver {
    /// Creates a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the store bridge is enabled but no
    /// store connection was provided.
    pub fn new(
        client: DirectoryClient,
        search: SearchConfig,
        bridge: StoreBridgeConfig,
        store: Option<Arc<dyn UserStore>>,
    ) -> Result<Self> {
        if bridge.enabled() && store.is_none() {
            return Err(Error::Config(
                "store bridge enabled but no store connection provided".to_string(),
            ));
        }

        let mapper = IdentityMapper::new(search.clone(), bridge.clone());
        Ok(Self {
            client,
            search,
            bridge,
            mapper,
            store,
        })
    }

    fn store(&self) -> Result<&dyn UserStore> {
        self.store.as_deref().ok_or_else(|| {
            Error::Config("store bridge enabled but no store connection provided".to_string())
        })
    }

    /// Composes the DN a user with the given login name binds as.
    fn login_dn(&self, username: &str) -> Result<DistinguishedName> {
        let base = DistinguishedName::parse(self.search.base_dn())?;
        Ok(base.with_prefix(self.search.login_attribute(), username))
    }
}

/// Reduces a result set to a single entry, treating ambiguity as absence.
fn single_entry(mut entries: Vec<DirectoryEntry>) -> Option<DirectoryEntry> {
    match entries.len() {
        1 => entries.pop(),
        0 => {
            debug!("directory search matched no entries");
            None
        }
        count => {
            warn!(count, "ambiguous directory result treated as absent");
            None
        }
    }
}

#[async_trait]
impl UserProvider for IdentityResolver {
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<Identity>> {
        let filter = filter::build(
            self.search.base_filter(),
            self.search.id_attribute(),
            identifier,
        );
        let entries = self.client.search(self.search.base_dn(), &filter).await?;
        let Some(entry) = single_entry(entries) else {
            return Ok(None);
        };

        if self.bridge.enabled() {
            self.mapper.merge_correlated(&entry, self.store()?).await
        } else {
            self.mapper.from_entry(&entry).map(Some)
        }
    }

    async fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Identity>> {
        // The raw username scopes the search base; the base filter is used
        // unmodified. Store enrichment happens only on the by-identifier
        // path.
        let base = self.login_dn(credentials.username())?;
        let entries = self
            .client
            .search(base.as_str(), self.search.base_filter())
            .await?;
        let Some(entry) = single_entry(entries) else {
            return Ok(None);
        };

        self.mapper.from_entry(&entry).map(Some)
    }

    async fn validate_credentials(
        &self,
        identity: Option<&Identity>,
        credentials: &Credentials,
    ) -> bool {
        if identity.is_none() {
            return false;
        }
        if credentials.password().is_empty() {
            return false;
        }
        let Ok(dn) = self.login_dn(credentials.username()) else {
            return false;
        };

        self.client
            .bind_as(dn.as_str(), credentials.password())
            .await
    }

    async fn update_remember_token(&self, identity: &Identity, token: &str) -> Result<()> {
        match identity {
            Identity::Store(identity) if identity.persistent() => {
                self.store()?
                    .set_field(
                        self.bridge.table(),
                        identity.key(),
                        self.bridge.token_field(),
                        &Value::String(token.to_string()),
                    )
                    .await
            }
            _ => Ok(()),
        }
    }
}
