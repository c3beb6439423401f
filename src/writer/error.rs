use http::StatusCode;
use std::fmt;
use std::io;

/// Failure while writing a response through the writer helpers.
#[derive(Debug)]
pub enum WriteError {
    /// The store has no response writer attached.
    NoWriter,
    /// A status line was already written for this response.
    HeaderAlreadyWritten {
        /// Status that went out first
        written: StatusCode,
        /// Status that was refused
        attempted: StatusCode,
    },
    /// Headers cannot change once the status line has been written.
    HeadersSent,
    /// The transport aborted the connection.
    ConnectionClosed,
    /// Header name or value is not valid HTTP.
    InvalidHeader {
        name: String,
    },
    /// Copying a payload into the response failed.
    Io(io::Error),
    /// JSON serialization failed.
    Json(serde_json::Error),
    /// The image encoder failed.
    Encode(io::Error),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::NoWriter => write!(f, "no response writer in request context"),
            WriteError::HeaderAlreadyWritten { written, attempted } => write!(
                f,
                "status {} already written, refusing to write {}",
                written.as_u16(),
                attempted.as_u16()
            ),
            WriteError::HeadersSent => write!(f, "headers already sent"),
            WriteError::ConnectionClosed => write!(f, "connection closed by transport"),
            WriteError::InvalidHeader { name } => write!(f, "invalid header '{name}'"),
            WriteError::Io(e) => write!(f, "response write failed: {e}"),
            WriteError::Json(e) => write!(f, "JSON encoding failed: {e}"),
            WriteError::Encode(e) => write!(f, "image encoding failed: {e}"),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Io(e) | WriteError::Encode(e) => Some(e),
            WriteError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WriteError {
    fn from(e: io::Error) -> Self {
        // Errors raised by our own io::Write impl carry the original WriteError
        if !e.get_ref().is_some_and(|inner| inner.is::<WriteError>()) {
            return WriteError::Io(e);
        }
        let kind = e.kind();
        match e.into_inner().map(|inner| inner.downcast::<WriteError>()) {
            Some(Ok(we)) => *we,
            Some(Err(other)) => WriteError::Io(io::Error::new(kind, other)),
            None => WriteError::Io(io::Error::from(kind)),
        }
    }
}

impl From<serde_json::Error> for WriteError {
    fn from(e: serde_json::Error) -> Self {
        WriteError::Json(e)
    }
}

impl From<WriteError> for io::Error {
    fn from(e: WriteError) -> Self {
        let kind = match e {
            WriteError::ConnectionClosed => io::ErrorKind::BrokenPipe,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}
