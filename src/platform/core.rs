use crate::logging::Logger;
use crate::store::{Environment, Store};
use std::fmt;
use std::sync::Arc;

/// Namespace could not be resolved or applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    /// The platform refused the namespace name.
    Invalid { namespace: String },
    /// The application's resolver failed.
    Resolve(String),
}

impl fmt::Display for NamespaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceError::Invalid { namespace } => {
                write!(f, "invalid namespace '{namespace}'")
            }
            NamespaceError::Resolve(msg) => write!(f, "namespace resolution failed: {msg}"),
        }
    }
}

impl std::error::Error for NamespaceError {}

/// Hostname of the serving instance is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostnameError {
    /// No request (or no `Host`) in the store.
    MissingHost,
    /// The hosted platform has no configured hostname.
    NotConfigured,
}

impl fmt::Display for HostnameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostnameError::MissingHost => write!(f, "request has no host"),
            HostnameError::NotConfigured => write!(f, "hostname is not configured"),
        }
    }
}

impl std::error::Error for HostnameError {}

/// One runtime target: where namespaces, logs and hostnames come from.
pub trait Platform: Send + Sync {
    fn environment(&self) -> Environment;

    /// Return a store scoped to `namespace`.
    fn apply_namespace(&self, store: &Store, namespace: &str) -> Result<Store, NamespaceError>;

    /// Hostname of the instance serving the request in `store`.
    fn hostname(&self, store: &Store) -> Result<String, HostnameError>;

    /// Logger used when the application does not inject one.
    fn default_logger(&self) -> Arc<dyn Logger>;
}

/// Application hook choosing a namespace per request.
///
/// An empty namespace means "none".
pub trait NamespaceResolver: Send + Sync {
    fn resolve(&self, store: &Store) -> Result<String, NamespaceError>;
}

impl<F> NamespaceResolver for F
where
    F: Fn(&Store) -> Result<String, NamespaceError> + Send + Sync,
{
    fn resolve(&self, store: &Store) -> Result<String, NamespaceError> {
        self(store)
    }
}

/// Resolver that never selects a namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNamespace;

impl NamespaceResolver for NoNamespace {
    fn resolve(&self, _store: &Store) -> Result<String, NamespaceError> {
        Ok(String::new())
    }
}
