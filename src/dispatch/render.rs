use crate::logging::Logger;
use crate::store::Store;
use crate::writer::{self, WriteError};
use http::StatusCode;
use std::sync::Arc;

/// Turns a resolved error into a response.
pub trait ErrorRenderer: Send + Sync {
    fn render(&self, store: &mut Store, code: StatusCode, err: &anyhow::Error) -> Result<(), WriteError>;
}

impl<F> ErrorRenderer for F
where
    F: Fn(&mut Store, StatusCode, &anyhow::Error) -> Result<(), WriteError> + Send + Sync,
{
    fn render(&self, store: &mut Store, code: StatusCode, err: &anyhow::Error) -> Result<(), WriteError> {
        self(store, code, err)
    }
}

/// Logs the error, then writes its display text as `text/plain`.
#[derive(Clone)]
pub struct PlainTextRenderer {
    logger: Arc<dyn Logger>,
}

impl PlainTextRenderer {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl ErrorRenderer for PlainTextRenderer {
    fn render(&self, store: &mut Store, code: StatusCode, err: &anyhow::Error) -> Result<(), WriteError> {
        self.logger
            .error(store, format_args!("error: {err:#} (status {})", code.as_u16()));
        writer::error(store, code, err)
    }
}
