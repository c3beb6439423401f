use super::core::{HostnameError, NamespaceError, Platform};
use crate::logging::{Logger, StandardLogger};
use crate::store::{Environment, Store, Value};
use std::sync::Arc;

/// Self-hosted process.
///
/// Namespaces are recorded as given; the hostname is the request's `Host`
/// without its port.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPlatform;

impl Platform for StandardPlatform {
    fn environment(&self) -> Environment {
        Environment::Standard
    }

    fn apply_namespace(&self, store: &Store, namespace: &str) -> Result<Store, NamespaceError> {
        if namespace.is_empty() {
            return Ok(store.clone());
        }
        Ok(store.with_value(Value::Namespace(Arc::from(namespace))))
    }

    fn hostname(&self, store: &Store) -> Result<String, HostnameError> {
        let host = store
            .request()
            .and_then(|r| r.host())
            .ok_or(HostnameError::MissingHost)?;
        let name = strip_port(host);
        if name.is_empty() {
            return Err(HostnameError::MissingHost);
        }
        Ok(name.to_string())
    }

    fn default_logger(&self) -> Arc<dyn Logger> {
        Arc::new(StandardLogger)
    }
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // [::1]:8080
        return rest.split(']').next().unwrap_or(rest);
    }
    host.split(':').next().unwrap_or(host)
}
