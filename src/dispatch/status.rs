use http::StatusCode;
use std::error::Error as StdError;
use std::fmt;

/// Errors that know which HTTP status they should produce.
///
/// Register the type with [`StatusCarriers`](super::StatusCarriers) so the
/// dispatcher can find it anywhere in an error's source chain.
pub trait HasStatusCode {
    fn status_code(&self) -> StatusCode;
}

/// A bare status code used as an error.
///
/// Displays the canonical reason phrase, so rendering `Status(NOT_FOUND)`
/// produces `Not Found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub StatusCode);

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.canonical_reason() {
            Some(reason) => f.write_str(reason),
            None => write!(f, "{}", self.0.as_u16()),
        }
    }
}

impl StdError for Status {}

impl HasStatusCode for Status {
    fn status_code(&self) -> StatusCode {
        self.0
    }
}

/// Any error annotated with the status it should produce.
///
/// Display and source are those of the wrapped error.
pub struct Coded {
    code: StatusCode,
    inner: anyhow::Error,
}

impl Coded {
    pub fn new(code: StatusCode, err: impl Into<anyhow::Error>) -> Self {
        Self {
            code,
            inner: err.into(),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl fmt::Display for Coded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for Coded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coded")
            .field("code", &self.code)
            .field("inner", &self.inner)
            .finish()
    }
}

impl StdError for Coded {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.inner)
    }
}

impl HasStatusCode for Coded {
    fn status_code(&self) -> StatusCode {
        self.code
    }
}

/// Wrap `err` so it dispatches with `code`.
pub fn coded(code: StatusCode, err: impl Into<anyhow::Error>) -> anyhow::Error {
    anyhow::Error::new(Coded::new(code, err))
}

/// Attach a status code to the error side of a `Result`.
///
/// ```rust
/// use http::StatusCode;
/// use reqctx::dispatch::ResultExt;
///
/// let parsed: anyhow::Result<u32> = "x".parse::<u32>().with_status(StatusCode::BAD_REQUEST);
/// assert!(parsed.is_err());
/// ```
pub trait ResultExt<T> {
    fn with_status(self, code: StatusCode) -> anyhow::Result<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn with_status(self, code: StatusCode) -> anyhow::Result<T> {
        self.map_err(|e| coded(code, e))
    }
}
