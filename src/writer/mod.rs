//! # Writer Module
//!
//! Response writer handle and the helpers application handlers use to send
//! a response.
//!
//! Every helper follows the same steps: set the content type, write the
//! status line once, record the code in the [`Store`](crate::store::Store),
//! then serialize the payload. A second status write on the same response is
//! refused with [`WriteError::HeaderAlreadyWritten`] and never reaches the
//! transport.
//!
//! ## Payloads
//!
//! [`Payload`] is the closed set of body shapes a helper accepts:
//!
//! - `Text` — written as UTF-8
//! - `Bytes` — written verbatim
//! - `Reader` — streamed with `io::copy`
//! - `Fallback` — anything else, formatted with `Display`
//!
//! `json` serializes structured values with `serde_json`; `json_payload` and
//! `xml` pass already-encoded documents through unchanged.
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use reqctx::store::{Store, Value};
//! use reqctx::writer::{self, ResponseWriter};
//!
//! let w = ResponseWriter::new();
//! let mut store = Store::new().with_value(Value::ResponseWriter(w.clone()));
//!
//! writer::text(&mut store, StatusCode::CREATED, "made it").unwrap();
//! assert_eq!(w.status(), Some(StatusCode::CREATED));
//! assert_eq!(store.code(), StatusCode::CREATED);
//! ```

mod error;
mod helpers;
pub mod mime;
mod payload;
mod response;

pub use error::WriteError;
pub use helpers::{
    bytes, css, error, font, html, image, json, json_payload, no_content, redirect, status, text,
    unauthorized, xml, ImageEncoder,
};
pub use payload::{write_payload, Payload};
pub use response::ResponseWriter;
