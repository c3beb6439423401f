use super::conditions::{NotFound, OverQuota, Timeout};
use super::status::{Coded, HasStatusCode, Status};
use crate::chain::Panicked;
use crate::request::{BuildError, DecodeError};
use http::StatusCode;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

type Matcher = dyn Fn(&anyhow::Error) -> bool + Send + Sync;

struct Rule {
    name: String,
    code: StatusCode,
    matches: Box<Matcher>,
}

/// True when `E` appears anywhere in the error's source chain.
fn caused_by<E: StdError + 'static>(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<E>())
}

fn is_timeout(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<Timeout>()
            || cause
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::TimedOut)
    })
}

/// Ordered error → status rules; the first matching rule wins.
///
/// Built once with [`PredicateTable::builder`] and read-only afterwards.
/// Clones share the same rules.
#[derive(Clone)]
pub struct PredicateTable {
    rules: Arc<[Rule]>,
}

impl PredicateTable {
    #[must_use]
    pub fn builder() -> PredicateTableBuilder {
        PredicateTableBuilder { rules: Vec::new() }
    }

    /// No rules: everything unclassified falls through to 500.
    #[must_use]
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// not-found → 404, over-quota → 429, timeout → 504.
    #[must_use]
    pub fn standard() -> Self {
        Self::builder().standard_rules().build()
    }

    /// Name and code of the first rule matching `err`.
    #[must_use]
    pub fn classify(&self, err: &anyhow::Error) -> Option<(&str, StatusCode)> {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(err))
            .map(|rule| (rule.name.as_str(), rule.code))
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PredicateTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| (r.name.as_str(), r.code.as_u16())))
            .finish()
    }
}

pub struct PredicateTableBuilder {
    rules: Vec<Rule>,
}

impl PredicateTableBuilder {
    /// Append a rule; rules are tried in insertion order.
    #[must_use]
    pub fn rule<F>(mut self, name: impl Into<String>, code: StatusCode, matches: F) -> Self
    where
        F: Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name: name.into(),
            code,
            matches: Box::new(matches),
        });
        self
    }

    /// Match errors of type `E` anywhere in the source chain.
    #[must_use]
    pub fn error_type<E: StdError + 'static>(self, name: impl Into<String>, code: StatusCode) -> Self {
        self.rule(name, code, caused_by::<E>)
    }

    /// Append the three standard rules.
    #[must_use]
    pub fn standard_rules(self) -> Self {
        self.error_type::<NotFound>("not-found", StatusCode::NOT_FOUND)
            .error_type::<OverQuota>("over-quota", StatusCode::TOO_MANY_REQUESTS)
            .rule("timeout", StatusCode::GATEWAY_TIMEOUT, is_timeout)
    }

    #[must_use]
    pub fn build(self) -> PredicateTable {
        PredicateTable {
            rules: self.rules.into(),
        }
    }
}

type Extractor = dyn Fn(&(dyn StdError + 'static)) -> Option<StatusCode> + Send + Sync;

/// Error types that carry their own status code.
///
/// The dispatcher walks the error's source chain and asks each registered
/// type in turn; the outermost carrier wins.
#[derive(Clone)]
pub struct StatusCarriers {
    extractors: Vec<Arc<Extractor>>,
}

impl StatusCarriers {
    /// No carriers at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// [`Status`], [`Coded`], [`BuildError`], [`DecodeError`] and [`Panicked`].
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .register::<Status>()
            .register::<Coded>()
            .register::<BuildError>()
            .register::<DecodeError>()
            .register::<Panicked>()
    }

    /// Recognise `T` as a status carrier.
    #[must_use]
    pub fn register<T>(mut self) -> Self
    where
        T: HasStatusCode + StdError + 'static,
    {
        self.extractors.push(Arc::new(|cause: &(dyn StdError + 'static)| {
            cause.downcast_ref::<T>().map(HasStatusCode::status_code)
        }));
        self
    }

    /// Status carried by `err` or any of its causes.
    #[must_use]
    pub fn status_of(&self, err: &anyhow::Error) -> Option<StatusCode> {
        err.chain()
            .find_map(|cause| self.extractors.iter().find_map(|extract| extract(cause)))
    }
}

impl Default for StatusCarriers {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for StatusCarriers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusCarriers")
            .field("registered", &self.extractors.len())
            .finish()
    }
}
