//! # reqctx
//!
//! **reqctx** carries per-request context through chains of HTTP handlers running on the
//! `may` coroutine runtime, and turns handler errors into HTTP status codes.
//!
//! ## Overview
//!
//! Every request gets an immutable, layered [`Store`](store::Store): the response writer, the
//! request itself, its parsed form and route variables, the buffered body, the platform tag
//! and an optional namespace. Handlers are plain functions over that store. When one fails,
//! a single error dispatcher picks the status code and renders the error response, once.
//!
//! ## Architecture
//!
//! - **[`store`]** - Persistent key/value context with copy-on-write extensions
//! - **[`request`]** - Builds the store from an `http::Request` (body, form, route vars)
//! - **[`writer`]** - Buffered, write-once response writer and content-type helpers
//! - **[`chain`]** - Ordered handler chains with short-circuit and panic recovery
//! - **[`dispatch`]** - Error to status classification and error rendering
//! - **[`platform`]** - Standard vs hosted runtime: namespaces, hostname, default logger
//! - **[`logging`]** - Leveled [`Logger`](logging::Logger) capability and subscriber setup
//! - **[`pipeline`]** - Wires the above into one request entry point
//! - **[`server`]** - `may_minihttp` adapter serving a pipeline over TCP
//! - **[`testing`]** - Synthetic requests for unit and integration tests
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::ContextService
//!     participant Builder as request::RequestBuilder
//!     participant Chain as chain::HandlerChain
//!     participant Dispatch as dispatch::ErrorDispatcher
//!     participant Writer as writer::ResponseWriter
//!
//!     Client->>Server: HTTP request
//!     Server->>Server: Router picks chain + RouteVars
//!     Server->>Builder: build(writer, request)
//!     Builder->>Builder: Read body (size-limited)
//!     Builder->>Builder: Parse form, merge route vars
//!     Builder->>Builder: Apply namespace via platform
//!     Builder-->>Server: Store (+ build errors)
//!
//!     loop each handler
//!         Server->>Chain: handler(&mut store)
//!         alt Ok
//!             Chain->>Writer: write status / body
//!         else Err or panic
//!             Chain->>Dispatch: dispatch(store, error)
//!             Dispatch->>Dispatch: explicit code, carrier, predicates, 500
//!             Dispatch->>Writer: render error once
//!             Note over Chain: remaining handlers skipped
//!         end
//!     end
//!
//!     Server->>Writer: take_response()
//!     Server-->>Client: HTTP response
//! ```
//!
//! ### Key Architectural Patterns
//!
//! 1. **Immutable context**: deriving a store never changes the parent, so a handler can hand
//!    a scoped store downstream without affecting siblings
//! 2. **One status line**: the writer refuses a second header write, and the dispatcher claims
//!    error rendering at most once per response
//! 3. **Pluggable classification**: status carriers and ordered predicates decide codes, so
//!    applications extend the mapping without touching handlers
//!
//! ## Quick Start
//!
//! ```rust
//! use reqctx::chain::HandlerChain;
//! use reqctx::dispatch::NotFound;
//! use reqctx::pipeline::Pipeline;
//! use reqctx::testing::TestRequest;
//! use reqctx::writer;
//! use http::StatusCode;
//!
//! let chain = HandlerChain::builder()
//!     .handler("load", |store| {
//!         if store.form_value("id") == "missing" {
//!             return Err(NotFound.into());
//!         }
//!         Ok(())
//!     })
//!     .handler("reply", |store| {
//!         writer::text(store, StatusCode::OK, "found")?;
//!         Ok(())
//!     })
//!     .build();
//!
//! let pipeline = Pipeline::builder().build();
//! let res = TestRequest::get("/items?id=missing")?.run(&pipeline, &chain);
//! assert_eq!(res.status(), StatusCode::NOT_FOUND);
//! assert_eq!(res.text(), "no such entity");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Configuration
//!
//! [`PipelineConfig::from_env`](config::PipelineConfig::from_env) reads `REQCTX_*` variables;
//! [`LogConfig::from_env`](logging::LogConfig::from_env) reads `REQCTX_LOG_*`. See the
//! [`config`] and [`logging`] modules.

pub mod chain;
pub mod config;
pub mod dispatch;
pub mod ids;
pub mod logging;
pub mod pipeline;
pub mod platform;
pub mod request;
pub mod server;
pub mod store;
pub mod testing;
pub mod user;
pub mod writer;

pub use chain::{ChainOutcome, HandlerChain};
pub use dispatch::{ErrorDispatcher, HasStatusCode, ResultExt, Status};
pub use pipeline::{Outcome, Pipeline, PipelineBuilder};
pub use store::{Environment, Key, Store, Value};
