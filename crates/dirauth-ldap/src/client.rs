//! Directory client with a scoped connect/bind/search/unbind lifecycle.
//!
//! Every public operation runs one logical transaction over a fresh
//! session: connect, bind (service account or anonymous), operate, unbind.
//! The unbind runs on every exit path, so a bind never leaks into a later
//! transaction. A session moves through `Unconnected → Connected → Bound →
//! Closed` and is never reused.

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use native_tls::{Certificate, TlsConnector};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::warn;

use dirauth_core::Error;

use crate::config::DirectoryConfig;
use crate::Result;

/// A raw directory entry: an attribute→values mapping plus the entry DN.
///
/// Constructed fresh per search result and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    dn: String,
    attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Creates an entry from its DN and attribute map.
    #[must_use]
    pub fn new(dn: impl Into<String>, attributes: HashMap<String, Vec<String>>) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// The entry's distinguished name.
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes.get(attribute).map(Vec::as_slice)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    async fn search(&mut self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryEntry>>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Directory client with a pluggable connection backend.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
}

impl DirectoryClient {
    /// Creates a client backed by a real LDAP connector.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector::new(config.clone()));
        Self { config, connector }
    }

    #[cfg(test)]
    pub(crate) fn with_connector(config: DirectoryConfig, connector: Box<dyn LdapConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Runs a single search transaction.
    ///
    /// In debug mode connection, bind, and search failures surface as
    /// [`Error::Connection`], [`Error::Bind`], and [`Error::Search`]. In
    /// production mode the same conditions are logged and degrade to an
    /// empty entry list. Deciding whether zero or many entries is an error
    /// is the resolver's concern, not the client's.
    ///
    /// # Errors
    ///
    /// Directory-domain errors, in debug mode only.
    pub async fn search(&self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryEntry>> {
        match self.search_transaction(base_dn, filter).await {
            Ok(entries) => Ok(entries),
            Err(err) if self.config.debug() || !err.is_directory_error() => Err(err),
            Err(err) => {
                warn!(error = %err, base_dn, "directory search degraded to empty result");
                Ok(Vec::new())
            }
        }
    }

    /// Attempts a credential-validation bind as `dn`.
    ///
    /// Returns true only when the bind succeeds; any failure, including
    /// malformed input, yields false. Never surfaces an error in either
    /// mode.
    pub async fn bind_as(&self, dn: &str, password: &str) -> bool {
        if dn.is_empty() || password.is_empty() {
            return false;
        }

        let Ok(mut session) = self.connector.connect().await else {
            return false;
        };
        let bound = self
            .execute_with_timeout(session.simple_bind(dn, password))
            .await
            .is_ok();
        let _ = session.unbind().await;
        bound
    }

    async fn search_transaction(&self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryEntry>> {
        let mut session = self.open_session().await?;
        let outcome = self
            .execute_with_timeout(session.search(base_dn, filter))
            .await;
        let _ = session.unbind().await;
        outcome
    }

    /// Connects and binds as the configured service account, or anonymously
    /// when no complete service account is configured.
    async fn open_session(&self) -> Result<Box<dyn LdapSession>> {
        let mut session = self.connector.connect().await?;

        let bind_outcome = match self.config.service_account() {
            Some(account) => {
                self.execute_with_timeout(
                    session.simple_bind(&account.bind_dn(), account.password()),
                )
                .await
            }
            None => self.execute_with_timeout(session.simple_bind("", "")).await,
        };

        if let Err(err) = bind_outcome {
            let _ = session.unbind().await;
            return Err(err);
        }
        Ok(session)
    }

    async fn execute_with_timeout<F, T>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        timeout(self.config.operation_timeout(), fut)
            .await
            .map_err(|_| Error::Timeout("directory operation timed out".to_string()))?
    }
}

/// Real LDAP connector backed by `ldap3`.
struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, self.config.url())
            .await
            .map_err(|err| Error::Connection(err.to_string()))?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession { inner: ldap }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = self
            .inner
            .simple_bind(dn, password)
            .await
            .map_err(|err| Error::Bind(err.to_string()))?;
        result
            .success()
            .map_err(|err| Error::Bind(err.to_string()))?;
        Ok(())
    }

    async fn search(&mut self, base_dn: &str, filter: &str) -> Result<Vec<DirectoryEntry>> {
        let result = self
            .inner
            .search(base_dn, Scope::Subtree, filter, vec!["*"])
            .await
            .map_err(|err| Error::Search(err.to_string()))?;
        let (entries, _) = result
            .success()
            .map_err(|err| Error::Search(err.to_string()))?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| DirectoryEntry::new(entry.dn, entry.attrs))
            .collect())
    }

    async fn unbind(&mut self) -> Result<()> {
        self.inner
            .unbind()
            .await
            .map_err(|err| Error::Connection(err.to_string()))
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connect_timeout());

    if !config.tls_verify() {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| Error::Config(format!("failed to construct TLS connector: {err}")))?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::Config(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::Config(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::Config(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}
