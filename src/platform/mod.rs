//! # Platform Module
//!
//! A [`Platform`] is the runtime target a pipeline is built for. It decides
//! how a namespace is applied to the request store, which [`Logger`] is used
//! by default, and where the instance hostname comes from.
//!
//! | | [`StandardPlatform`] | [`HostedPlatform`] |
//! |---|---|---|
//! | environment tag | `standard` | `hosted` |
//! | namespace | stored when non-empty | validated, then stored |
//! | default logger | [`StandardLogger`] | [`HostedLogger`] |
//! | hostname | request `Host` minus port | configured value |
//!
//! Applications pick the namespace per request with a
//! [`NamespaceResolver`]; the default [`NoNamespace`] never selects one.
//!
//! [`Logger`]: crate::logging::Logger
//! [`StandardLogger`]: crate::logging::StandardLogger
//! [`HostedLogger`]: crate::logging::HostedLogger

mod core;
mod hosted;
mod standard;

pub use core::{HostnameError, NamespaceError, NamespaceResolver, NoNamespace, Platform};
pub use hosted::HostedPlatform;
pub use standard::StandardPlatform;

use crate::store::{Environment, Store};
use std::sync::Arc;

/// Platform implementation for an environment tag.
#[must_use]
pub fn for_environment(env: Environment, hostname: Option<String>) -> Arc<dyn Platform> {
    match env {
        Environment::Standard => Arc::new(StandardPlatform),
        Environment::Hosted => Arc::new(HostedPlatform::new(hostname)),
    }
}

/// Hostname of the serving instance, asked of the platform registered on
/// `store` (the standard platform when none is).
pub fn hostname(store: &Store) -> Result<String, HostnameError> {
    match store.extension::<Arc<dyn Platform>>() {
        Some(platform) => platform.hostname(store),
        None => StandardPlatform.hostname(store),
    }
}
