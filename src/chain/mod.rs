//! # Chain Module
//!
//! A [`HandlerChain`] is the ordered list of handler functions serving one
//! route. [`HandlerChain::run`] calls them in order on the request store and
//! stops at the first error, which goes to the
//! [`ErrorDispatcher`](crate::dispatch::ErrorDispatcher) exactly once.
//!
//! A panicking handler is caught and treated as a [`Panicked`] error, so it
//! renders a `500` instead of taking the connection coroutine down.
//!
//! ```rust
//! use http::StatusCode;
//! use reqctx::chain::HandlerChain;
//! use reqctx::dispatch::{ErrorDispatcher, NotFound};
//! use reqctx::store::{Store, Value};
//! use reqctx::writer::{self, ResponseWriter};
//!
//! let chain = HandlerChain::builder()
//!     .handler("auth", |_store: &mut Store| Ok(()))
//!     .handler("load", |_store: &mut Store| Err(NotFound.into()))
//!     .handler("render", |store: &mut Store| {
//!         writer::text(store, StatusCode::OK, "unreachable")?;
//!         Ok(())
//!     })
//!     .build();
//!
//! let w = ResponseWriter::new();
//! let store = Store::new().with_value(Value::ResponseWriter(w.clone()));
//! let outcome = chain.run(store, &ErrorDispatcher::default());
//!
//! assert_eq!(outcome.dispatched_code(), Some(StatusCode::NOT_FOUND));
//! assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
//! ```

mod core;

pub use core::{ChainOutcome, HandlerChain, HandlerChainBuilder, HandlerFn, Panicked};

#[cfg(test)]
mod tests;
