use crate::request::RequestHandle;
use crate::writer::ResponseWriter;
use bytes::Bytes;
use http::{Extensions, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Runtime target a store was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Self-hosted process serving requests directly.
    #[default]
    Standard,
    /// Managed hosting platform with namespaces and platform log sinks.
    Hosted,
}

impl Environment {
    /// Parse an environment tag, falling back to `Standard`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" | "appengine" => Environment::Hosted,
            _ => Environment::Standard,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Standard => "standard",
            Environment::Hosted => "hosted",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of keys a [`Store`] understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Namespace,
    RequestBody,
    RequestVars,
    ResponseWriter,
    Request,
    ResponseCode,
    Environment,
}

impl Key {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Key::Namespace => "namespace",
            Key::RequestBody => "request.body",
            Key::RequestVars => "request.vars",
            Key::ResponseWriter => "http.responsewriter",
            Key::Request => "request",
            Key::ResponseCode => "response.code",
            Key::Environment => "environment",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value stored under exactly one [`Key`].
///
/// The key is derived from the variant, so a value can never be filed under
/// the wrong key.
#[derive(Debug, Clone)]
pub enum Value {
    Namespace(Arc<str>),
    RequestBody(Bytes),
    RequestVars(Arc<HashMap<String, String>>),
    ResponseWriter(ResponseWriter),
    Request(RequestHandle),
    ResponseCode(StatusCode),
    Environment(Environment),
}

impl Value {
    #[must_use]
    pub fn key(&self) -> Key {
        match self {
            Value::Namespace(_) => Key::Namespace,
            Value::RequestBody(_) => Key::RequestBody,
            Value::RequestVars(_) => Key::RequestVars,
            Value::ResponseWriter(_) => Key::ResponseWriter,
            Value::Request(_) => Key::Request,
            Value::ResponseCode(_) => Key::ResponseCode,
            Value::Environment(_) => Key::Environment,
        }
    }
}

struct Node {
    value: Value,
    parent: Option<Arc<Node>>,
}

impl Drop for Node {
    // Unlink iteratively so long histories cannot overflow a coroutine stack.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// Immutable per-request context.
///
/// Every write returns a new `Store` that shares its history with the parent:
/// values are kept in a persistent linked list of `Arc` nodes, newest first.
/// Cloning is two reference-count increments. A snapshot never changes after
/// it has been handed out, so concurrent readers are always safe.
///
/// Application data that is not one of the core [`Key`]s goes into the typed
/// extension map ([`Store::with_extension`]), which is copied on write.
#[derive(Clone, Default)]
pub struct Store {
    head: Option<Arc<Node>>,
    extensions: Arc<Extensions>,
}

impl Store {
    /// An empty store with no values and no extensions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a template of user-owned extensions.
    #[must_use]
    pub fn with_extensions(extensions: Extensions) -> Self {
        Self {
            head: None,
            extensions: Arc::new(extensions),
        }
    }

    /// Return a new store where `value` shadows any previous value for its key.
    #[must_use]
    pub fn with_value(&self, value: Value) -> Store {
        Store {
            head: Some(Arc::new(Node {
                value,
                parent: self.head.clone(),
            })),
            extensions: Arc::clone(&self.extensions),
        }
    }

    /// Look up the newest value for `key`.
    #[must_use]
    pub fn get(&self, key: Key) -> Option<&Value> {
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            if node.value.key() == key {
                return Some(&node.value);
            }
            cursor = node.parent.as_deref();
        }
        None
    }

    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Replace this binding with a store that records `code` as the response code.
    ///
    /// Older snapshots (clones taken before the call) still report their
    /// previous code.
    pub fn set_code(&mut self, code: StatusCode) {
        if self.explicit_code() == Some(code) {
            return;
        }
        *self = self.with_value(Value::ResponseCode(code));
    }

    /// Response code for this request, `200 OK` unless one was set.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.explicit_code().unwrap_or(StatusCode::OK)
    }

    /// Response code only if one was explicitly recorded.
    #[must_use]
    pub fn explicit_code(&self) -> Option<StatusCode> {
        match self.get(Key::ResponseCode) {
            Some(Value::ResponseCode(code)) => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self.get(Key::Namespace) {
            Some(Value::Namespace(ns)) => Some(ns),
            _ => None,
        }
    }

    /// Buffered request body, empty when none was captured.
    #[must_use]
    pub fn body(&self) -> Bytes {
        match self.get(Key::RequestBody) {
            Some(Value::RequestBody(b)) => b.clone(),
            _ => Bytes::new(),
        }
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.contains(Key::RequestBody)
    }

    /// Buffered request body decoded as UTF-8 (lossy).
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    /// Merged form and route variables.
    #[must_use]
    pub fn vars(&self) -> Option<&HashMap<String, String>> {
        match self.get(Key::RequestVars) {
            Some(Value::RequestVars(v)) => Some(v),
            _ => None,
        }
    }

    /// Form or route variable by name, empty when absent.
    #[must_use]
    pub fn form_value(&self, key: &str) -> &str {
        self.vars()
            .and_then(|v| v.get(key))
            .map(String::as_str)
            .unwrap_or("")
    }

    #[must_use]
    pub fn writer(&self) -> Option<&ResponseWriter> {
        match self.get(Key::ResponseWriter) {
            Some(Value::ResponseWriter(w)) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub fn request(&self) -> Option<&RequestHandle> {
        match self.get(Key::Request) {
            Some(Value::Request(r)) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        match self.get(Key::Environment) {
            Some(Value::Environment(env)) => *env,
            _ => Environment::default(),
        }
    }

    /// True once the transport has aborted the underlying connection.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.writer().is_some_and(ResponseWriter::is_aborted)
    }

    /// Typed application value from the extension map.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Return a new store with `value` inserted into the extension map.
    #[must_use]
    pub fn with_extension<T: Clone + Send + Sync + 'static>(&self, value: T) -> Store {
        let mut extensions = (*self.extensions).clone();
        extensions.insert(value);
        Store {
            head: self.head.clone(),
            extensions: Arc::new(extensions),
        }
    }

    /// Keys present in this store, newest first, without duplicates.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        let mut keys = Vec::new();
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            let key = node.value.key();
            if !keys.contains(&key) {
                keys.push(key);
            }
            cursor = node.parent.as_deref();
        }
        keys
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.keys())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
