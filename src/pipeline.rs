//! # Pipeline Module
//!
//! A [`Pipeline`] bundles every capability a request needs: the platform,
//! the [`RequestBuilder`], the [`ErrorDispatcher`] and the logger. It is
//! configured once with [`PipelineBuilder`] at startup and is read-only
//! afterwards; clones share the same configuration.
//!
//! [`Pipeline::handle`] serves one request:
//!
//! 1. build the store (see [`crate::request`])
//! 2. under [`BuildPolicy::Strict`], dispatch the first build error and stop
//! 3. otherwise run the handler chain, dispatching its first error
//!
//! Every request runs inside a `request` tracing span carrying the method,
//! path, request id, status and latency.
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use reqctx::chain::HandlerChain;
//! use reqctx::pipeline::Pipeline;
//! use reqctx::store::Store;
//! use reqctx::writer::{self, ResponseWriter};
//!
//! let pipeline = Pipeline::builder().build();
//! let chain = HandlerChain::single("hello", |store: &mut Store| {
//!     let name = store.form_value("name").to_string();
//!     writer::text(store, StatusCode::OK, format!("hello {name}"))?;
//!     Ok(())
//! });
//!
//! let w = ResponseWriter::new();
//! let req = http::Request::get("/hello?name=ada").body(std::io::empty()).unwrap();
//! pipeline.handle(w.clone(), req, &chain);
//! assert_eq!(&w.body()[..], b"hello ada");
//! ```

use crate::chain::{ChainOutcome, HandlerChain};
use crate::config::PipelineConfig;
use crate::dispatch::{ErrorDispatcher, ErrorRenderer, PredicateTable, StatusCarriers};
use crate::logging::Logger;
use crate::platform::{self, NamespaceResolver, Platform, StandardPlatform};
use crate::request::{
    BuildPolicy, DiagnosticHook, RequestBuilder, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_FORM_BYTES,
};
use crate::store::Store;
use crate::user::{UserResolver, UserSlot};
use crate::writer::ResponseWriter;
use http::{Extensions, StatusCode};
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field, info, info_span};

/// Result of serving one request.
#[derive(Debug)]
pub enum Outcome {
    /// The handler chain ran (to completion, failure or cancellation).
    Ran(ChainOutcome),
    /// Strict build policy refused the request before any handler ran.
    Rejected {
        store: Store,
        code: Option<StatusCode>,
        error: anyhow::Error,
    },
}

impl Outcome {
    #[must_use]
    pub fn store(&self) -> &Store {
        match self {
            Outcome::Ran(chain) => chain.store(),
            Outcome::Rejected { store, .. } => store,
        }
    }

    #[must_use]
    pub fn into_store(self) -> Store {
        match self {
            Outcome::Ran(chain) => chain.into_store(),
            Outcome::Rejected { store, .. } => store,
        }
    }

    /// Code of the error rendered for this request, if any.
    #[must_use]
    pub fn dispatched_code(&self) -> Option<StatusCode> {
        match self {
            Outcome::Ran(chain) => chain.dispatched_code(),
            Outcome::Rejected { code, .. } => *code,
        }
    }
}

/// Capabilities shared by every request.
#[derive(Clone)]
pub struct Pipeline {
    builder: RequestBuilder,
    dispatcher: ErrorDispatcher,
    policy: BuildPolicy,
    logger: Arc<dyn Logger>,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Pipeline configured from `REQCTX_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        PipelineBuilder::from_config(&PipelineConfig::from_env()).build()
    }

    #[must_use]
    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    #[must_use]
    pub fn dispatcher(&self) -> &ErrorDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn policy(&self) -> BuildPolicy {
        self.policy
    }

    #[must_use]
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    #[must_use]
    pub fn platform(&self) -> &Arc<dyn Platform> {
        self.builder.platform()
    }

    /// Serve one request with `chain`, writing into `writer`.
    pub fn handle<B: Read>(
        &self,
        writer: ResponseWriter,
        request: http::Request<B>,
        chain: &HandlerChain,
    ) -> Outcome {
        let start = Instant::now();
        let span = info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = field::Empty,
            status = field::Empty,
            latency_ms = field::Empty
        );
        let _entered = span.enter();

        let report = self.builder.build(writer.clone(), request);
        if let Some(req) = report.store.request() {
            span.record("request_id", field::display(req.id()));
        }

        let (mut store, first_error) = report.into_parts();
        let outcome = match (self.policy, first_error) {
            (BuildPolicy::Strict, Some(err)) => {
                let error = anyhow::Error::new(err);
                let code = self.dispatcher.dispatch(&mut store, &error);
                Outcome::Rejected { store, code, error }
            }
            _ => Outcome::Ran(chain.run(store, &self.dispatcher)),
        };

        let status = writer.status().unwrap_or(StatusCode::OK).as_u16();
        let latency_ms = start.elapsed().as_millis() as u64;
        span.record("status", status);
        span.record("latency_ms", latency_ms);
        info!(status, latency_ms, handlers = chain.len(), "Request completed");
        outcome
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("builder", &self.builder)
            .field("dispatcher", &self.dispatcher)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Startup-time configuration of a [`Pipeline`].
pub struct PipelineBuilder {
    platform: Option<Arc<dyn Platform>>,
    namespace_resolver: Option<Arc<dyn NamespaceResolver>>,
    predicates: PredicateTable,
    carriers: StatusCarriers,
    renderer: Option<Arc<dyn ErrorRenderer>>,
    logger: Option<Arc<dyn Logger>>,
    policy: BuildPolicy,
    max_body_bytes: usize,
    max_form_bytes: usize,
    diagnostic: Option<DiagnosticHook>,
    extensions: Extensions,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            platform: None,
            namespace_resolver: None,
            predicates: PredicateTable::standard(),
            carriers: StatusCarriers::standard(),
            renderer: None,
            logger: None,
            policy: BuildPolicy::BestEffort,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
            diagnostic: None,
            extensions: Extensions::new(),
        }
    }
}

impl PipelineBuilder {
    /// Builder preloaded from startup configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::default()
            .platform(platform::for_environment(
                config.platform,
                config.hostname.clone(),
            ))
            .build_policy(config.build_policy)
            .max_body_bytes(config.max_body_bytes)
            .max_form_bytes(config.max_form_bytes)
    }

    #[must_use]
    pub fn platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    #[must_use]
    pub fn namespace_resolver(mut self, resolver: Arc<dyn NamespaceResolver>) -> Self {
        self.namespace_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn predicates(mut self, predicates: PredicateTable) -> Self {
        self.predicates = predicates;
        self
    }

    #[must_use]
    pub fn carriers(mut self, carriers: StatusCarriers) -> Self {
        self.carriers = carriers;
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn ErrorRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Logger for build diagnostics and the default renderer.
    ///
    /// Defaults to the platform's logger.
    #[must_use]
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn build_policy(mut self, policy: BuildPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    #[must_use]
    pub fn max_form_bytes(mut self, limit: usize) -> Self {
        self.max_form_bytes = limit;
        self
    }

    /// Called with every build error after it is logged.
    #[must_use]
    pub fn on_build_error(mut self, hook: DiagnosticHook) -> Self {
        self.diagnostic = Some(hook);
        self
    }

    /// Application value copied into every request store.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Resolver used by [`crate::user::user`] for user type `U`.
    #[must_use]
    pub fn user_resolver<U: 'static>(mut self, resolver: Arc<dyn UserResolver<U>>) -> Self {
        self.extensions.insert(UserSlot::new(resolver));
        self
    }

    #[must_use]
    pub fn build(self) -> Pipeline {
        let platform = self
            .platform
            .unwrap_or_else(|| Arc::new(StandardPlatform));
        let logger = self.logger.unwrap_or_else(|| platform.default_logger());

        let mut extensions = self.extensions;
        extensions.insert(Arc::clone(&logger));
        extensions.insert(Arc::clone(&platform));

        let mut builder = RequestBuilder::new(Arc::clone(&platform))
            .with_logger(Arc::clone(&logger))
            .with_max_body_bytes(self.max_body_bytes)
            .with_max_form_bytes(self.max_form_bytes)
            .with_extensions(extensions);
        if let Some(resolver) = self.namespace_resolver {
            builder = builder.with_namespace_resolver(resolver);
        }
        if let Some(hook) = self.diagnostic {
            builder = builder.with_diagnostic_hook(hook);
        }

        let mut dispatcher = ErrorDispatcher::new(Arc::clone(&logger))
            .with_predicates(self.predicates)
            .with_carriers(self.carriers);
        if let Some(renderer) = self.renderer {
            dispatcher = dispatcher.with_renderer(renderer);
        }

        Pipeline {
            builder,
            dispatcher,
            policy: self.policy,
            logger,
        }
    }
}
