//! # Store Module
//!
//! The per-request context. A [`Store`] is created by the request builder,
//! threaded through the handler chain and the error dispatcher, and dropped
//! when the response is finished. It is never shared between requests.
//!
//! ## Keys
//!
//! Core values live under a closed set of typed [`Key`]s, each paired with one
//! [`Value`] variant:
//!
//! | Key | Value |
//! |---|---|
//! | `namespace` | storage namespace selected for the request |
//! | `request.body` | buffered request body |
//! | `request.vars` | merged form and route variables |
//! | `http.responsewriter` | the response writer handle |
//! | `request` | the request handle |
//! | `response.code` | status code recorded by writers or `set_code` |
//! | `environment` | `standard` or `hosted` |
//!
//! Anything else goes into the typed extension map, which belongs to the
//! application.
//!
//! ## Persistence
//!
//! ```rust
//! use reqctx::store::{Environment, Key, Store, Value};
//!
//! let base = Store::new().with_value(Value::Environment(Environment::Standard));
//! let next = base.with_value(Value::Namespace("tenant-a".into()));
//!
//! assert_eq!(next.namespace(), Some("tenant-a"));
//! assert!(base.get(Key::Namespace).is_none());
//! assert_eq!(next.environment(), Environment::Standard);
//! ```

mod core;

pub use core::{Environment, Key, Store, Value};

#[cfg(test)]
mod tests;
