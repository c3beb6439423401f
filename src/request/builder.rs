use super::form::{merge_route_vars, parse_form, FormError};
use super::handle::{RequestHandle, RouteVars};
use crate::dispatch::HasStatusCode;
use crate::ids::RequestId;
use crate::logging::Logger;
use crate::platform::{NamespaceError, NamespaceResolver, NoNamespace, Platform, StandardPlatform};
use crate::store::{Store, Value};
use crate::writer::ResponseWriter;
use bytes::Bytes;
use http::{Extensions, StatusCode};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cap on a buffered request body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 << 20;
/// Default cap on a urlencoded form body.
pub const DEFAULT_MAX_FORM_BYTES: usize = 10 << 20;

/// What to do with errors hit while building the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPolicy {
    /// Log, report, and run the handlers anyway.
    #[default]
    BestEffort,
    /// Dispatch the first build error instead of running the handlers.
    Strict,
}

impl BuildPolicy {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => BuildPolicy::Strict,
            _ => BuildPolicy::BestEffort,
        }
    }
}

/// Failure while building a request store.
#[derive(Debug)]
pub enum BuildError {
    BodyRead(io::Error),
    BodyTooLarge { limit: usize },
    Form(FormError),
    Namespace(NamespaceError),
}

impl BuildError {
    /// The body read failed because the client went away.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            BuildError::BodyRead(e) if matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        )
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::BodyRead(e) => write!(f, "failed to read request body: {e}"),
            BuildError::BodyTooLarge { limit } => {
                write!(f, "request body larger than {limit} bytes")
            }
            BuildError::Form(e) => write!(f, "failed to parse form: {e}"),
            BuildError::Namespace(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::BodyRead(e) => Some(e),
            BuildError::Form(e) => Some(e),
            BuildError::Namespace(e) => Some(e),
            BuildError::BodyTooLarge { .. } => None,
        }
    }
}

impl HasStatusCode for BuildError {
    fn status_code(&self) -> StatusCode {
        match self {
            BuildError::BodyRead(_) => StatusCode::BAD_REQUEST,
            BuildError::BodyTooLarge { .. } | BuildError::Form(FormError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            BuildError::Form(_) => StatusCode::BAD_REQUEST,
            BuildError::Namespace(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Callback told about every build error, after it has been logged.
pub type DiagnosticHook = Arc<dyn Fn(&Store, &BuildError) + Send + Sync>;

/// A built store plus every error met on the way, in the order they happened.
#[derive(Debug)]
pub struct BuildReport {
    pub store: Store,
    pub errors: Vec<BuildError>,
}

impl BuildReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Split into the store and the first error, if any.
    #[must_use]
    pub fn into_parts(self) -> (Store, Option<BuildError>) {
        (self.store, self.errors.into_iter().next())
    }
}

/// Populates a fresh [`Store`] for every inbound request.
///
/// Cheap to clone; configure it once and share it.
#[derive(Clone)]
pub struct RequestBuilder {
    platform: Arc<dyn Platform>,
    namespace: Arc<dyn NamespaceResolver>,
    logger: Arc<dyn Logger>,
    max_body_bytes: usize,
    max_form_bytes: usize,
    diagnostic: Option<DiagnosticHook>,
    extensions: Extensions,
}

impl RequestBuilder {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        let logger = platform.default_logger();
        Self {
            platform,
            namespace: Arc::new(NoNamespace),
            logger,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
            diagnostic: None,
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn with_namespace_resolver(mut self, resolver: Arc<dyn NamespaceResolver>) -> Self {
        self.namespace = resolver;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    #[must_use]
    pub fn with_max_form_bytes(mut self, limit: usize) -> Self {
        self.max_form_bytes = limit;
        self
    }

    #[must_use]
    pub fn with_diagnostic_hook(mut self, hook: DiagnosticHook) -> Self {
        self.diagnostic = Some(hook);
        self
    }

    /// Extensions every new store starts with.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    #[must_use]
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    fn read_body<B: Read>(&self, body: B) -> Result<Bytes, BuildError> {
        let limit = self.max_body_bytes;
        let mut buf = Vec::new();
        body.take(limit as u64 + 1)
            .read_to_end(&mut buf)
            .map_err(BuildError::BodyRead)?;
        if buf.len() > limit {
            return Err(BuildError::BodyTooLarge { limit });
        }
        Ok(Bytes::from(buf))
    }

    /// Build the store for one request.
    ///
    /// Never fails outright: each step that goes wrong is logged, reported
    /// to the diagnostic hook and collected in the report, and the store is
    /// left without the value that step would have set.
    pub fn build<B: Read>(&self, writer: ResponseWriter, request: http::Request<B>) -> BuildReport {
        let (parts, body) = request.into_parts();
        let mut errors = Vec::new();

        let body = match self.read_body(body) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                if e.is_connection_lost() {
                    // Later writes fail with ConnectionClosed and the chain stops
                    writer.abort();
                }
                errors.push(e);
                None
            }
        };
        let captured = body.clone().unwrap_or_default();

        let (mut vars, form_err) = parse_form(&parts, &captured, self.max_form_bytes);
        merge_route_vars(&mut vars, parts.extensions.get::<RouteVars>());

        let id = RequestId::from_header_or_new(
            parts
                .headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
        );
        let handle = RequestHandle::new(id, parts, captured);

        let mut store = Store::with_extensions(self.extensions.clone())
            .with_value(Value::Environment(self.platform.environment()))
            .with_value(Value::Request(handle))
            .with_value(Value::ResponseWriter(writer));

        match self
            .namespace
            .resolve(&store)
            .and_then(|ns| self.platform.apply_namespace(&store, &ns))
        {
            Ok(scoped) => store = scoped,
            Err(e) => errors.push(BuildError::Namespace(e)),
        }

        store = store.with_value(Value::RequestVars(Arc::new(vars)));
        if let Some(e) = form_err {
            errors.push(BuildError::Form(e));
        }

        if let Some(bytes) = body {
            store = store.with_value(Value::RequestBody(bytes));
        }

        for err in &errors {
            warn!(request_id = %id, error = %err, "Request build step failed");
            self.logger
                .warning(&store, format_args!("request build: {err}"));
            if let Some(hook) = &self.diagnostic {
                hook(&store, err);
            }
        }
        debug!(
            request_id = %id,
            environment = %store.environment(),
            namespace = store.namespace().unwrap_or(""),
            body_len = store.body().len(),
            errors = errors.len(),
            "Request store built"
        );

        BuildReport { store, errors }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(Arc::new(StandardPlatform))
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("environment", &self.platform.environment())
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_form_bytes", &self.max_form_bytes)
            .field("diagnostic_hook", &self.diagnostic.is_some())
            .finish()
    }
}
