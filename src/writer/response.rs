use super::error::WriteError;
use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct ResponseState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

#[derive(Default)]
struct Shared {
    state: Mutex<ResponseState>,
    aborted: AtomicBool,
    error_dispatched: AtomicBool,
}

/// Handle to the response of one request.
///
/// Clones share the same response. The status line can be written exactly
/// once; every later attempt is refused with
/// [`WriteError::HeaderAlreadyWritten`] instead of reaching the transport.
/// Writing body bytes before a status implies `200 OK`, as HTTP servers do.
///
/// The response is buffered and handed to the transport by the server
/// adapter once the pipeline finishes.
#[derive(Clone, Default)]
pub struct ResponseWriter {
    inner: Arc<Shared>,
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ResponseState> {
        // A panicking handler must not take the response down with it
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), WriteError> {
        if self.is_aborted() {
            return Err(WriteError::ConnectionClosed);
        }
        Ok(())
    }

    /// Set (replace) a response header. Refused once the status is written.
    pub fn set_header(&self, name: HeaderName, value: &str) -> Result<(), WriteError> {
        let value = HeaderValue::from_str(value).map_err(|_| WriteError::InvalidHeader {
            name: name.to_string(),
        })?;
        let mut state = self.state();
        if state.status.is_some() {
            return Err(WriteError::HeadersSent);
        }
        state.headers.insert(name, value);
        Ok(())
    }

    /// Current value of a response header.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<String> {
        self.state()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Snapshot of the response headers.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        self.state().headers.clone()
    }

    /// Write the status line.
    pub fn write_header(&self, code: StatusCode) -> Result<(), WriteError> {
        self.begin(code, None)
    }

    /// Set the content type and write the status line in one step.
    ///
    /// Both happen under the same lock, so a concurrent writer can never slip
    /// its own status in between.
    pub fn begin(&self, code: StatusCode, content_type: Option<&str>) -> Result<(), WriteError> {
        self.ensure_open()?;
        let content_type = content_type
            .map(|ct| {
                HeaderValue::from_str(ct).map_err(|_| WriteError::InvalidHeader {
                    name: CONTENT_TYPE.to_string(),
                })
            })
            .transpose()?;
        let mut state = self.state();
        if let Some(written) = state.status {
            warn!(
                written = written.as_u16(),
                attempted = code.as_u16(),
                "Superfluous status write refused"
            );
            return Err(WriteError::HeaderAlreadyWritten {
                written,
                attempted: code,
            });
        }
        if let Some(ct) = content_type {
            state.headers.insert(CONTENT_TYPE, ct);
        }
        state.status = Some(code);
        debug!(status = code.as_u16(), "Status line written");
        Ok(())
    }

    /// Append body bytes, writing an implicit `200 OK` status if needed.
    pub fn write_body(&self, data: &[u8]) -> Result<usize, WriteError> {
        self.ensure_open()?;
        let mut state = self.state();
        if state.status.is_none() {
            state.status = Some(StatusCode::OK);
        }
        state.body.extend_from_slice(data);
        Ok(data.len())
    }

    /// Status written so far, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.state().status
    }

    #[must_use]
    pub fn is_written(&self) -> bool {
        self.status().is_some()
    }

    /// Copy of the body written so far.
    #[must_use]
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state().body)
    }

    /// Mark the connection as closed; all further writes fail.
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Claim the single error rendering slot for this response.
    ///
    /// Returns `true` for the first caller only.
    pub fn claim_error_dispatch(&self) -> bool {
        !self.inner.error_dispatched.swap(true, Ordering::SeqCst)
    }

    /// Move the buffered response out, leaving an empty body behind.
    ///
    /// A response that never wrote a status becomes `200 OK` with no body.
    pub fn take_response(&self) -> Response<Bytes> {
        let mut state = self.state();
        let status = state.status.unwrap_or(StatusCode::OK);
        let body = std::mem::take(&mut state.body).freeze();
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = state.headers.clone();
        response
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open().map_err(io::Error::from)
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ResponseWriter")
            .field("status", &state.status)
            .field("headers", &state.headers.len())
            .field("body_len", &state.body.len())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
