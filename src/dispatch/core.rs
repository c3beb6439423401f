use super::predicates::{PredicateTable, StatusCarriers};
use super::render::{ErrorRenderer, PlainTextRenderer};
use crate::logging::{Logger, StandardLogger};
use crate::store::Store;
use http::StatusCode;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a resolved status code came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// Set on the store by a handler or writer helper.
    Explicit,
    /// Carried by the error itself.
    Carried,
    /// Matched the named predicate rule.
    Predicate(String),
    /// Nothing matched.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub code: StatusCode,
    pub source: CodeSource,
}

/// Maps handler errors to status codes and renders them.
///
/// Precedence, first match wins:
///
/// 1. a code explicitly recorded on the store that is not `200`
/// 2. a status carried by the error (see [`StatusCarriers`])
/// 3. the [`PredicateTable`] in order
/// 4. `500 Internal Server Error`
#[derive(Clone)]
pub struct ErrorDispatcher {
    predicates: PredicateTable,
    carriers: StatusCarriers,
    renderer: Arc<dyn ErrorRenderer>,
}

impl ErrorDispatcher {
    /// Standard tables with a [`PlainTextRenderer`] logging through `logger`.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            predicates: PredicateTable::standard(),
            carriers: StatusCarriers::standard(),
            renderer: Arc::new(PlainTextRenderer::new(logger)),
        }
    }

    #[must_use]
    pub fn with_predicates(mut self, predicates: PredicateTable) -> Self {
        self.predicates = predicates;
        self
    }

    #[must_use]
    pub fn with_carriers(mut self, carriers: StatusCarriers) -> Self {
        self.carriers = carriers;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ErrorRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn predicates(&self) -> &PredicateTable {
        &self.predicates
    }

    /// Resolve the status code for `err` without rendering anything.
    #[must_use]
    pub fn resolve(&self, store: &Store, err: &anyhow::Error) -> Resolution {
        if let Some(code) = store.explicit_code().filter(|c| *c != StatusCode::OK) {
            return Resolution {
                code,
                source: CodeSource::Explicit,
            };
        }
        if let Some(code) = self.carriers.status_of(err) {
            return Resolution {
                code,
                source: CodeSource::Carried,
            };
        }
        if let Some((name, code)) = self.predicates.classify(err) {
            return Resolution {
                code,
                source: CodeSource::Predicate(name.to_string()),
            };
        }
        Resolution {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            source: CodeSource::Default,
        }
    }

    /// Resolve and render `err` for the response in `store`.
    ///
    /// Only the first dispatch for a response renders; later calls return
    /// `None` and leave the response alone.
    pub fn dispatch(&self, store: &mut Store, err: &anyhow::Error) -> Option<StatusCode> {
        if let Some(writer) = store.writer() {
            if !writer.claim_error_dispatch() {
                debug!(error = %err, "Error already dispatched for this response, ignoring");
                return None;
            }
        }

        let resolution = self.resolve(store, err);
        warn!(
            status = resolution.code.as_u16(),
            source = ?resolution.source,
            error = %err,
            "Handler error dispatched"
        );

        if let Err(write_err) = self.renderer.render(store, resolution.code, err) {
            warn!(
                status = resolution.code.as_u16(),
                error = %write_err,
                "Error response could not be written"
            );
        }
        Some(resolution.code)
    }
}

impl Default for ErrorDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(StandardLogger))
    }
}

impl std::fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorDispatcher")
            .field("predicates", &self.predicates)
            .field("carriers", &self.carriers)
            .finish()
    }
}
