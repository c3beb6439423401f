//! # Request Module
//!
//! Builds the per-request [`Store`](crate::store::Store) and exposes the
//! inbound request to handlers.
//!
//! [`RequestBuilder::build`] runs these steps, each best effort:
//!
//! 1. buffer the body (up to the configured limit)
//! 2. tag the store with the platform's environment
//! 3. attach the [`RequestHandle`] and the response writer
//! 4. resolve and apply the namespace
//! 5. merge form values and router variables into `request.vars`
//! 6. store the captured body
//!
//! Form values come from the query string and, for POST, PUT and PATCH with
//! `application/x-www-form-urlencoded`, from the body. Body values beat
//! query values, and [`RouteVars`] placed in the request extensions by the
//! router beat both.
//!
//! Failures are returned in the [`BuildReport`] and, by default, do not stop
//! the request. With [`BuildPolicy::Strict`] the pipeline dispatches the
//! first one instead of running the handlers.
//!
//! ## Example
//!
//! ```rust
//! use reqctx::request::{RequestBuilder, RouteVars};
//! use reqctx::writer::ResponseWriter;
//!
//! let mut req = http::Request::builder()
//!     .uri("/pets/7?id=9&sort=asc")
//!     .body(std::io::empty())
//!     .unwrap();
//! req.extensions_mut()
//!     .insert([("id", "7")].into_iter().collect::<RouteVars>());
//!
//! let report = RequestBuilder::default().build(ResponseWriter::new(), req);
//! assert!(report.is_clean());
//! assert_eq!(report.store.form_value("id"), "7");
//! assert_eq!(report.store.form_value("sort"), "asc");
//! ```

mod builder;
mod decode;
mod form;
mod handle;

pub use builder::{
    BuildError, BuildPolicy, BuildReport, DiagnosticHook, RequestBuilder, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_FORM_BYTES,
};
pub use decode::{decode, DecodeError};
pub use form::{parse_urlencoded, FormError};
pub use handle::{RequestHandle, RouteVars};

#[cfg(test)]
mod tests;
