//! Configuration types for the directory identity provider.
//!
//! All three structures deserialize from a flat key/value configuration
//! set and validate at construction. They are immutable once built and
//! owned by the resolver for its lifetime.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

use dirauth_core::provider::ServiceCredentials;
use dirauth_core::Error;
use crate::Result;

/// Default connect timeout (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default per-operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

const fn default_protocol_version() -> u8 {
    3
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

/// Connection and bind-lifecycle configuration for the directory endpoint.
///
/// The service account is optional: when `username`, `password`, and
/// `root_dn` are all present the client binds as
/// `uid=<username>,<root-dn>`, otherwise it binds anonymously.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Directory endpoint URL, e.g. `ldaps://ldap.example.com:636`.
    #[validate(url)]
    url: String,

    /// Directory protocol version. Retained as configuration surface for
    /// flat key/value sets; the client always speaks version 3.
    #[validate(range(min = 2, max = 3))]
    #[serde(default = "default_protocol_version")]
    version: u8,

    #[serde(default)]
    username: Option<String>,

    #[serde(default)]
    password: Option<SecretString>,

    #[serde(default)]
    root_dn: Option<String>,

    /// Whether directory failures surface as errors (`true`) or degrade to
    /// empty results (`false`).
    #[serde(default)]
    debug: bool,

    #[serde(default = "default_tls_verify")]
    tls_verify: bool,

    #[serde(default)]
    tls_ca_cert: Option<PathBuf>,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    operation_timeout_secs: u64,
}

impl DirectoryConfig {
    /// Creates a configuration for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_string = url.into();
        Url::parse(&url_string)?;

        Ok(Self {
            url: url_string,
            version: default_protocol_version(),
            username: None,
            password: None,
            root_dn: None,
            debug: false,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        })
    }

    /// Validates a deserialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a constraint is violated.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(Error::from)
    }

    /// Returns the directory endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the configured protocol version.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Returns true when directory failures should surface as errors.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Returns the service-account credentials when the configuration
    /// carries all three of username, password, and root DN.
    #[must_use]
    pub fn service_account(&self) -> Option<ServiceCredentials> {
        match (&self.username, &self.password, &self.root_dn) {
            (Some(username), Some(password), Some(root_dn)) => Some(ServiceCredentials::new(
                username.clone(),
                password.expose_secret().to_owned(),
                root_dn.clone(),
            )),
            _ => None,
        }
    }

    /// Returns the connect timeout duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the per-operation timeout duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Sets the service account used for the initial bind.
    #[must_use]
    pub fn with_service_account(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        root_dn: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self.root_dn = Some(root_dn.into());
        self
    }

    /// Enables or disables debug-mode error surfacing.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the protocol version.
    #[must_use]
    pub const fn with_protocol_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets a custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connect timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Overrides the per-operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }
}

fn default_base_filter() -> String {
    "(objectclass=*)".to_string()
}

/// Search configuration: where to search and how to project entries.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchConfig {
    /// Base DN searches start from.
    #[validate(length(min = 1))]
    base_dn: String,

    /// Base filter template every lookup is constrained against.
    #[serde(default = "default_base_filter")]
    base_filter: String,

    /// Attribute holding the stable identifier, e.g. `uidNumber`.
    #[validate(length(min = 1))]
    id_attribute: String,

    /// Attribute users log in with, e.g. `uid`.
    #[validate(length(min = 1))]
    login_attribute: String,

    /// Directory attribute → identity field projection.
    #[serde(default)]
    attribute_map: BTreeMap<String, String>,
}

impl SearchConfig {
    /// Creates a search configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required value is empty.
    pub fn new(
        base_dn: impl Into<String>,
        id_attribute: impl Into<String>,
        login_attribute: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            base_dn: base_dn.into(),
            base_filter: default_base_filter(),
            id_attribute: id_attribute.into(),
            login_attribute: login_attribute.into(),
            attribute_map: BTreeMap::new(),
        };
        config.validate().map_err(Error::from)?;
        Ok(config)
    }

    /// Returns the search base DN.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Returns the base filter template.
    #[must_use]
    pub fn base_filter(&self) -> &str {
        &self.base_filter
    }

    /// Returns the stable-identifier attribute name.
    #[must_use]
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Returns the login attribute name.
    #[must_use]
    pub fn login_attribute(&self) -> &str {
        &self.login_attribute
    }

    /// Returns the attribute→field projection map.
    #[must_use]
    pub fn attribute_map(&self) -> &BTreeMap<String, String> {
        &self.attribute_map
    }

    /// Overrides the base filter template.
    #[must_use]
    pub fn with_base_filter(mut self, filter: impl Into<String>) -> Self {
        self.base_filter = filter.into();
        self
    }

    /// Projects `source` directory attribute values into `field` on the
    /// resolved identity.
    #[must_use]
    pub fn map_attribute(mut self, source: impl Into<String>, field: impl Into<String>) -> Self {
        self.attribute_map.insert(source.into(), field.into());
        self
    }
}

fn default_store_table() -> String {
    "users".to_string()
}

fn default_key_field() -> String {
    "id".to_string()
}

fn default_token_field() -> String {
    "remember_token".to_string()
}

/// Store-bridge configuration: whether and how a directory entry is
/// correlated with a record in the secondary store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StoreBridgeConfig {
    /// Whether the secondary store is consulted at all.
    #[serde(default)]
    enabled: bool,

    /// Store table (or collection) user records live in.
    #[serde(default = "default_store_table")]
    table: String,

    /// Directory attribute whose value correlates an entry with a record.
    #[validate(length(min = 1))]
    directory_attribute: String,

    /// Store field compared against the correlation attribute.
    #[validate(length(min = 1))]
    store_field: String,

    /// When true, resolve to a fully modeled record that keeps its store's
    /// persistence capability; when false, to a minimal generic record.
    #[serde(default)]
    full_model: bool,

    /// Primary-key field of the store table.
    #[serde(default = "default_key_field")]
    key_field: String,

    /// Field the remember-me token is written to.
    #[serde(default = "default_token_field")]
    token_field: String,
}

impl StoreBridgeConfig {
    /// Creates a disabled bridge configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            table: default_store_table(),
            directory_attribute: "uid".to_string(),
            store_field: "user_name".to_string(),
            full_model: false,
            key_field: default_key_field(),
            token_field: default_token_field(),
        }
    }

    /// Creates an enabled bridge correlating `directory_attribute` with
    /// `store_field` in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a correlation name is empty.
    pub fn new(
        table: impl Into<String>,
        directory_attribute: impl Into<String>,
        store_field: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            enabled: true,
            table: table.into(),
            directory_attribute: directory_attribute.into(),
            store_field: store_field.into(),
            full_model: false,
            key_field: default_key_field(),
            token_field: default_token_field(),
        };
        config.validate().map_err(Error::from)?;
        Ok(config)
    }

    /// Whether the bridge is consulted.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// The store table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The directory-side correlation attribute.
    #[must_use]
    pub fn directory_attribute(&self) -> &str {
        &self.directory_attribute
    }

    /// The store-side correlation field.
    #[must_use]
    pub fn store_field(&self) -> &str {
        &self.store_field
    }

    /// Whether resolved identities are fully modeled records.
    #[must_use]
    pub const fn full_model(&self) -> bool {
        self.full_model
    }

    /// The primary-key field name.
    #[must_use]
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// The remember-token field name.
    #[must_use]
    pub fn token_field(&self) -> &str {
        &self.token_field
    }

    /// Selects fully modeled or minimal records.
    #[must_use]
    pub const fn with_full_model(mut self, full_model: bool) -> Self {
        self.full_model = full_model;
        self
    }

    /// Overrides the primary-key field name.
    #[must_use]
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    /// Overrides the remember-token field name.
    #[must_use]
    pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }
}
