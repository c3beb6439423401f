use crate::ids::RequestId;
use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE, HOST};
use http::request::Parts;
use http::{Extensions, Method, Uri};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// Route-pattern variables supplied by the router.
///
/// The router attaches them to the request's extensions before the request
/// builder runs; the builder merges them into `request.vars`, where they win
/// over form values with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteVars(pub HashMap<String, String>);

impl RouteVars {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RouteVars(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

struct Inner {
    id: RequestId,
    parts: Parts,
    body: Bytes,
}

/// Shared, read-only view of the inbound request.
///
/// The body has already been buffered by the request builder, so any number
/// of readers can consume it independently through [`body_reader`].
///
/// [`body_reader`]: RequestHandle::body_reader
#[derive(Clone)]
pub struct RequestHandle {
    inner: Arc<Inner>,
}

impl RequestHandle {
    #[must_use]
    pub fn new(id: RequestId, parts: Parts, body: Bytes) -> Self {
        Self {
            inner: Arc::new(Inner { id, parts, body }),
        }
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.inner.id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.parts.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.inner.parts.uri
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.inner.parts.uri.path()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.inner.parts.uri.query()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.parts.headers
    }

    /// Header value as text; `None` when absent or not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// `Host` header, falling back to the URI authority.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header(HOST.as_str())
            .or_else(|| self.inner.parts.uri.authority().map(|a| a.as_str()))
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.inner.parts.extensions
    }

    #[must_use]
    pub fn route_vars(&self) -> Option<&RouteVars> {
        self.inner.parts.extensions.get::<RouteVars>()
    }

    /// Captured body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// A fresh reader positioned at the start of the captured body.
    #[must_use]
    pub fn body_reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.inner.body.clone())
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.inner.id)
            .field("method", &self.inner.parts.method)
            .field("uri", &self.inner.parts.uri)
            .field("body_len", &self.inner.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn handle(host: Option<&str>, uri: &str) -> RequestHandle {
        let mut b = http::Request::builder().method(Method::POST).uri(uri);
        if let Some(h) = host {
            b = b.header(HOST, h);
        }
        let (parts, _) = b.body(()).unwrap().into_parts();
        RequestHandle::new(RequestId::new(), parts, Bytes::from_static(b"payload"))
    }

    #[test]
    fn test_body_reader_is_rereadable() {
        let h = handle(None, "/x");
        let mut first = String::new();
        h.body_reader().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        h.body_reader().read_to_string(&mut second).unwrap();
        assert_eq!(first, "payload");
        assert_eq!(first, second);
    }

    #[test]
    fn test_host_prefers_header() {
        assert_eq!(
            handle(Some("api.local:8080"), "http://other/x").host(),
            Some("api.local:8080")
        );
        assert_eq!(handle(None, "http://other:9/x").host(), Some("other:9"));
        assert_eq!(handle(None, "/x").host(), None);
    }

    #[test]
    fn test_route_vars_from_iter() {
        let vars: RouteVars = [("id", "7")].into_iter().collect();
        assert_eq!(vars.get("id"), Some("7"));
        assert!(!vars.is_empty());
    }
}
