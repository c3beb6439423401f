//! # Server Module
//!
//! Serves a [`Pipeline`](crate::pipeline::Pipeline) over `may_minihttp`.
//!
//! ## Request Flow
//!
//! 1. [`with_http_request`] copies method, target and headers out of the
//!    transport request and exposes the body as a reader
//! 2. [`ContextService`] asks its [`Router`] for a chain and attaches the
//!    route variables as a request extension
//! 3. The pipeline builds the store and runs the chain; handlers write into
//!    a buffered [`ResponseWriter`](crate::writer::ResponseWriter)
//! 4. [`write_response`] flushes the buffered response to the connection
//!
//! Requests with no route run a chain failing with `404`, so the configured
//! error renderer shapes that response like any other error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reqctx::chain::HandlerChain;
//! use reqctx::pipeline::Pipeline;
//! use reqctx::server::{ContextService, HttpServer, RouteMatch};
//! use reqctx::writer;
//! use http::{Method, StatusCode};
//! use std::sync::Arc;
//!
//! let hello = HandlerChain::single("hello", |store| {
//!     writer::text(store, StatusCode::OK, "hello")?;
//!     Ok(())
//! });
//! let router = move |method: &Method, path: &str| {
//!     (*method == Method::GET && path == "/hello").then(|| RouteMatch::new(hello.clone()))
//! };
//! let service = ContextService::new(Pipeline::from_env(), Arc::new(router));
//! let handle = HttpServer(service).start("127.0.0.1:8080")?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::with_http_request;
pub use response::{status_reason, write_response, MAX_INTERNED_HEADERS};
pub use service::{ContextService, RouteMatch, Router};
