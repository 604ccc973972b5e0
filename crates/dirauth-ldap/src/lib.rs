//! LDAP directory identity provider.
//!
//! This crate resolves and authenticates user identities against an
//! LDAP-style directory, optionally cross-referencing a relational store,
//! and produces the normalized [`Identity`](dirauth_core::Identity) model
//! consumed by any authentication layer through the
//! [`UserProvider`](dirauth_core::UserProvider) contract.

#![deny(missing_docs)]

mod client;
mod config;
mod dn;
pub mod filter;
mod mapper;
mod resolver;
#[cfg(test)]
mod testing;

pub use client::{DirectoryClient, DirectoryEntry};
pub use config::{
    DirectoryConfig, SearchConfig, StoreBridgeConfig, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
pub use dn::{DistinguishedName, DistinguishedNameError};
pub use mapper::IdentityMapper;
pub use resolver::IdentityResolver;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirauth_core::Result<T>;
