//! Credential types and the user-provider contract.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{Identity, Result};

/// A username/password pair presented by the host framework.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential set.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The presented password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Service-account credentials used for the directory's initial bind.
///
/// The bind DN is composed as `uid=<username>,<root-dn>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCredentials {
    username: String,
    password: SecretString,
    root_dn: String,
}

impl ServiceCredentials {
    /// Creates new service credentials.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        root_dn: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            root_dn: root_dn.into(),
        }
    }

    /// The service-account login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The root DN the service account lives under.
    #[must_use]
    pub fn root_dn(&self) -> &str {
        &self.root_dn
    }

    /// Composes the DN the service account binds as.
    #[must_use]
    pub fn bind_dn(&self) -> String {
        format!("uid={},{}", self.username, self.root_dn)
    }

    /// Exposes the bind password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// The contract a directory-backed resolver exposes to its host
/// authentication framework.
///
/// Exactly four operations, matching a standard user-provider interface.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Retrieves an identity by its stable external identifier.
    ///
    /// Resolves to `None` when the lookup matches no user or is ambiguous.
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<Identity>>;

    /// Retrieves an identity matching the given credential set's username.
    ///
    /// Does not validate the password; resolves to `None` when the lookup
    /// matches no user or is ambiguous.
    async fn retrieve_by_credentials(&self, credentials: &Credentials)
        -> Result<Option<Identity>>;

    /// Validates credentials against the directory.
    ///
    /// Fails closed: an absent identity, an empty password, or any
    /// directory failure yields `false`. Never errors.
    async fn validate_credentials(
        &self,
        identity: Option<&Identity>,
        credentials: &Credentials,
    ) -> bool;

    /// Updates the remember-me token for the given identity.
    ///
    /// A no-op unless the identity carries persistence capability.
    async fn update_remember_token(&self, identity: &Identity, token: &str) -> Result<()>;
}
