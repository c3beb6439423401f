//! # Dispatch Module
//!
//! Turns a handler error into an HTTP status code and a response body.
//!
//! ## Resolution
//!
//! [`ErrorDispatcher::resolve`] picks the code; the first match wins:
//!
//! 1. **Explicit** - the store already records a code other than `200`
//!    (a handler called `set_code` or a writer helper ran).
//! 2. **Carried** - the error, or anything in its source chain, is a type
//!    registered with [`StatusCarriers`]: [`Status`], [`Coded`] (see
//!    [`ResultExt::with_status`]), build errors, caught panics, plus any
//!    application type implementing [`HasStatusCode`].
//! 3. **Predicate** - the [`PredicateTable`] rules in order. The standard
//!    table maps [`NotFound`] → 404, [`OverQuota`] → 429 and [`Timeout`]
//!    (or an `io::ErrorKind::TimedOut`) → 504.
//! 4. **Default** - `500`.
//!
//! ## Rendering
//!
//! The resolved code goes to an [`ErrorRenderer`]. [`PlainTextRenderer`]
//! logs through the injected logger and writes the error's display text as
//! `text/plain`. Each response renders at most one error; repeated
//! dispatches are ignored.
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use reqctx::dispatch::{ErrorDispatcher, NotFound};
//! use reqctx::store::{Store, Value};
//! use reqctx::writer::ResponseWriter;
//!
//! let w = ResponseWriter::new();
//! let mut store = Store::new().with_value(Value::ResponseWriter(w.clone()));
//!
//! let code = ErrorDispatcher::default().dispatch(&mut store, &NotFound.into());
//! assert_eq!(code, Some(StatusCode::NOT_FOUND));
//! assert_eq!(&w.body()[..], b"no such entity");
//! ```

mod conditions;
mod core;
mod predicates;
mod render;
mod status;

pub use conditions::{NotFound, OverQuota, Timeout};
pub use core::{CodeSource, ErrorDispatcher, Resolution};
pub use predicates::{PredicateTable, PredicateTableBuilder, StatusCarriers};
pub use render::{ErrorRenderer, PlainTextRenderer};
pub use status::{coded, Coded, HasStatusCode, ResultExt, Status};
