//! Helpers for exercising handler chains without a socket.
//!
//! A [`TestRequest`] is a synthetic request; [`TestRequest::run`] pushes it
//! through a [`Pipeline`] exactly as the server adapter does and returns the
//! buffered response next to the pipeline [`Outcome`].
//!
//! ```rust
//! use reqctx::chain::HandlerChain;
//! use reqctx::pipeline::Pipeline;
//! use reqctx::testing::TestRequest;
//! use reqctx::writer;
//! use http::StatusCode;
//!
//! let echo = HandlerChain::single("echo", |store| {
//!     let name = store.form_value("name").to_string();
//!     writer::text(store, StatusCode::OK, name)?;
//!     Ok(())
//! });
//! let res = TestRequest::post_form("/greet", &[("name", "ferris")])?
//!     .run(&Pipeline::builder().build(), &echo);
//! assert_eq!(res.status(), StatusCode::OK);
//! assert_eq!(res.text(), "ferris");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::chain::HandlerChain;
use crate::pipeline::{Outcome, Pipeline};
use crate::request::{BuildReport, RouteVars};
use crate::store::Store;
use crate::writer::{mime, ResponseWriter};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Cursor;

/// A synthetic request.
#[derive(Debug)]
pub struct TestRequest {
    request: http::Request<Bytes>,
}

impl TestRequest {
    #[must_use]
    pub fn new(request: http::Request<Bytes>) -> Self {
        Self { request }
    }

    /// Bodyless `GET`.
    pub fn get(uri: &str) -> anyhow::Result<Self> {
        let request = http::Request::get(uri).body(Bytes::new())?;
        Ok(Self::new(request))
    }

    /// `POST` with a raw body and content type.
    pub fn post(uri: &str, content_type: &str, body: impl Into<Bytes>) -> anyhow::Result<Self> {
        let request = http::Request::post(uri)
            .header(CONTENT_TYPE, content_type)
            .body(body.into())?;
        Ok(Self::new(request))
    }

    /// `POST` with `value` serialized as the JSON body.
    pub fn post_json<T: Serialize + ?Sized>(uri: &str, value: &T) -> anyhow::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Self::post(uri, mime::APPLICATION_JSON, body)
    }

    /// `POST` with `pairs` URL-encoded as the form body.
    pub fn post_form(uri: &str, pairs: &[(&str, &str)]) -> anyhow::Result<Self> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self::post(uri, mime::APPLICATION_FORM, body)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        *self.request.method_mut() = method;
        self
    }

    /// Add a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.request.headers_mut().append(name, value);
        }
        self
    }

    /// Attach a route variable, as a router would.
    #[must_use]
    pub fn route_var(mut self, key: &str, value: &str) -> Self {
        let extensions = self.request.extensions_mut();
        match extensions.get_mut::<RouteVars>() {
            Some(vars) => vars.insert(key, value),
            None => {
                let mut vars = RouteVars::new();
                vars.insert(key, value);
                extensions.insert(vars);
            }
        }
        self
    }

    /// Build the request store only, without running any handler.
    #[must_use]
    pub fn build(self, pipeline: &Pipeline) -> (BuildReport, ResponseWriter) {
        let writer = ResponseWriter::new();
        let report = pipeline
            .request_builder()
            .build(writer.clone(), self.request.map(Cursor::new));
        (report, writer)
    }

    /// Serve the request with `chain` through `pipeline`.
    #[must_use]
    pub fn run(self, pipeline: &Pipeline, chain: &HandlerChain) -> TestResponse {
        let writer = ResponseWriter::new();
        let outcome = pipeline.handle(writer.clone(), self.request.map(Cursor::new), chain);
        TestResponse {
            response: writer.take_response(),
            outcome,
        }
    }
}

/// What a [`TestRequest`] produced.
#[derive(Debug)]
pub struct TestResponse {
    response: http::Response<Bytes>,
    outcome: Outcome,
}

impl TestResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.headers().get(name)?.to_str().ok()
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.response.body()
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.response.body()).into_owned()
    }

    /// Decode the response body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(self.response.body())
    }

    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Store as the last handler left it.
    #[must_use]
    pub fn store(&self) -> &Store {
        self.outcome.store()
    }

    #[must_use]
    pub fn into_parts(self) -> (http::Response<Bytes>, Outcome) {
        (self.response, self.outcome)
    }
}
