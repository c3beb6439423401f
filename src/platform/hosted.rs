use super::core::{HostnameError, NamespaceError, Platform};
use crate::logging::{HostedLogger, Logger};
use crate::store::{Environment, Store, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

#[allow(clippy::expect_used)]
static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z._-]{0,100}$").expect("valid namespace regex"));

/// Managed hosting platform.
///
/// Namespace names are validated before they are applied, logs go to the
/// hosted collector target, and the hostname comes from configuration
/// rather than the request.
#[derive(Debug, Clone, Default)]
pub struct HostedPlatform {
    hostname: Option<String>,
}

impl HostedPlatform {
    #[must_use]
    pub fn new(hostname: Option<String>) -> Self {
        Self { hostname }
    }

    /// Whether `namespace` is accepted by the platform.
    #[must_use]
    pub fn is_valid_namespace(namespace: &str) -> bool {
        NAMESPACE_RE.is_match(namespace)
    }
}

impl Platform for HostedPlatform {
    fn environment(&self) -> Environment {
        Environment::Hosted
    }

    fn apply_namespace(&self, store: &Store, namespace: &str) -> Result<Store, NamespaceError> {
        if !Self::is_valid_namespace(namespace) {
            return Err(NamespaceError::Invalid {
                namespace: namespace.to_string(),
            });
        }
        if namespace.is_empty() {
            return Ok(store.clone());
        }
        Ok(store.with_value(Value::Namespace(Arc::from(namespace))))
    }

    fn hostname(&self, _store: &Store) -> Result<String, HostnameError> {
        self.hostname
            .clone()
            .filter(|h| !h.is_empty())
            .ok_or(HostnameError::NotConfigured)
    }

    fn default_logger(&self) -> Arc<dyn Logger> {
        Arc::new(HostedLogger)
    }
}
