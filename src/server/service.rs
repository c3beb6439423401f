use super::request::with_http_request;
use super::response::write_response;
use crate::chain::HandlerChain;
use crate::dispatch::Status;
use crate::pipeline::Pipeline;
use crate::request::RouteVars;
use crate::writer::ResponseWriter;
use http::{Method, StatusCode};
use may_minihttp::{HttpService, Request, Response};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::warn;

/// A chain selected for one request, with the variables the router
/// extracted from the path.
#[derive(Clone, Debug)]
pub struct RouteMatch {
    pub chain: HandlerChain,
    pub vars: RouteVars,
}

impl RouteMatch {
    #[must_use]
    pub fn new(chain: HandlerChain) -> Self {
        Self {
            chain,
            vars: RouteVars::new(),
        }
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key, value);
        self
    }
}

/// Maps method and path to a handler chain.
///
/// Pattern matching is up to the implementation; closures of the same
/// shape implement this trait.
pub trait Router: Send + Sync {
    fn route(&self, method: &Method, path: &str) -> Option<RouteMatch>;
}

impl<F> Router for F
where
    F: Fn(&Method, &str) -> Option<RouteMatch> + Send + Sync,
{
    fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self(method, path)
    }
}

/// `HttpService` running every request through a [`Pipeline`].
///
/// Unrouted requests run a one-step chain failing with `404`, so they go
/// through the same error dispatch as handler failures.
#[derive(Clone)]
pub struct ContextService {
    pipeline: Pipeline,
    router: Arc<dyn Router>,
    not_found: HandlerChain,
}

impl ContextService {
    pub fn new(pipeline: Pipeline, router: Arc<dyn Router>) -> Self {
        Self {
            pipeline,
            router,
            not_found: HandlerChain::single("not-found", |_| {
                Err(Status(StatusCode::NOT_FOUND).into())
            }),
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl fmt::Debug for ContextService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextService")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl HttpService for ContextService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let writer = ResponseWriter::new();
        let served = with_http_request(req, |mut request| {
            let route = self.router.route(request.method(), request.uri().path());
            let chain = match route {
                Some(RouteMatch { chain, vars }) => {
                    request.extensions_mut().insert(vars);
                    chain
                }
                None => self.not_found.clone(),
            };
            self.pipeline.handle(writer.clone(), request, &chain)
        });

        match served {
            Ok(_) => write_response(res, writer.take_response()),
            Err(err) => {
                warn!(error = %err, "Rejecting malformed request");
                res.status_code(400, "Bad Request");
                res.header("Content-Type: text/plain; charset=utf-8");
                res.body_vec(format!("{err}\n").into_bytes());
            }
        }
        Ok(())
    }
}
