use crate::dispatch::{ErrorDispatcher, HasStatusCode};
use crate::store::Store;
use http::StatusCode;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// One step of a chain.
///
/// Handlers read the store and may replace it (for example by recording a
/// response code). Returning an error stops the chain.
pub type HandlerFn = dyn Fn(&mut Store) -> anyhow::Result<()> + Send + Sync;

/// A handler panicked; reported as `500`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panicked {
    pub handler: String,
    pub message: String,
}

impl Panicked {
    fn from_payload(handler: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self {
            handler: handler.to_string(),
            message,
        }
    }
}

impl fmt::Display for Panicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler '{}' panicked: {}", self.handler, self.message)
    }
}

impl std::error::Error for Panicked {}

impl HasStatusCode for Panicked {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

struct Step {
    name: String,
    handler: Box<HandlerFn>,
}

/// How a chain run ended.
#[derive(Debug)]
pub enum ChainOutcome {
    /// Every handler returned `Ok`.
    Completed { store: Store },
    /// Handler `index` failed and the error was dispatched.
    ///
    /// `code` is `None` when an error had already been rendered for this
    /// response.
    Failed {
        store: Store,
        index: usize,
        code: Option<StatusCode>,
        error: anyhow::Error,
    },
    /// The connection was aborted before handler `index` ran.
    Cancelled { store: Store, index: usize },
}

impl ChainOutcome {
    #[must_use]
    pub fn store(&self) -> &Store {
        match self {
            ChainOutcome::Completed { store }
            | ChainOutcome::Failed { store, .. }
            | ChainOutcome::Cancelled { store, .. } => store,
        }
    }

    #[must_use]
    pub fn into_store(self) -> Store {
        match self {
            ChainOutcome::Completed { store }
            | ChainOutcome::Failed { store, .. }
            | ChainOutcome::Cancelled { store, .. } => store,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, ChainOutcome::Completed { .. })
    }

    /// Status dispatched for a failed run.
    #[must_use]
    pub fn dispatched_code(&self) -> Option<StatusCode> {
        match self {
            ChainOutcome::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

/// Ordered, immutable list of handlers.
///
/// Cloning shares the handlers.
#[derive(Clone)]
pub struct HandlerChain {
    steps: Arc<[Step]>,
}

impl HandlerChain {
    #[must_use]
    pub fn builder() -> HandlerChainBuilder {
        HandlerChainBuilder { steps: Vec::new() }
    }

    /// Chain with a single handler.
    pub fn single<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Store) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::builder().handler(name, handler).build()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    /// Run the handlers in order against `store`.
    ///
    /// The first error (or panic) is handed to `dispatcher` once and no later
    /// handler runs. A fully successful run writes nothing by itself.
    pub fn run(&self, mut store: Store, dispatcher: &ErrorDispatcher) -> ChainOutcome {
        for (index, step) in self.steps.iter().enumerate() {
            if store.is_cancelled() {
                debug!(handler = %step.name, index, "Connection aborted, chain stopped");
                return ChainOutcome::Cancelled { store, index };
            }

            let result = catch_unwind(AssertUnwindSafe(|| (step.handler)(&mut store)));
            let err = match result {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(payload) => {
                    let panicked = Panicked::from_payload(&step.name, payload);
                    error!(
                        handler = %step.name,
                        index,
                        message = %panicked.message,
                        "Handler panicked"
                    );
                    anyhow::Error::new(panicked)
                }
            };

            debug!(handler = %step.name, index, error = %err, "Handler failed, chain stopped");
            let code = dispatcher.dispatch(&mut store, &err);
            return ChainOutcome::Failed {
                store,
                index,
                code,
                error: err,
            };
        }
        ChainOutcome::Completed { store }
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub struct HandlerChainBuilder {
    steps: Vec<Step>,
}

impl HandlerChainBuilder {
    /// Append a named handler.
    #[must_use]
    pub fn handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Store) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.steps.push(Step {
            name: name.into(),
            handler: Box::new(handler),
        });
        self
    }

    /// Append a handler named after its position.
    #[must_use]
    pub fn then<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Store) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = format!("handler-{}", self.steps.len());
        self.handler(name, handler)
    }

    #[must_use]
    pub fn build(self) -> HandlerChain {
        HandlerChain {
            steps: self.steps.into(),
        }
    }
}
