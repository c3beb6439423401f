use crate::dispatch::HasStatusCode;
use crate::store::Store;
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;

#[derive(Debug)]
pub enum DecodeError {
    /// The store holds no captured body.
    NoRequestBody,
    Json(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NoRequestBody => write!(f, "no request body"),
            DecodeError::Json(e) => write!(f, "invalid JSON body: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Json(e) => Some(e),
            DecodeError::NoRequestBody => None,
        }
    }
}

impl HasStatusCode for DecodeError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Decode the captured request body as JSON.
///
/// The body stays in the store, so it can be decoded or read again.
pub fn decode<T: DeserializeOwned>(store: &Store) -> Result<T, DecodeError> {
    if !store.has_body() {
        return Err(DecodeError::NoRequestBody);
    }
    serde_json::from_slice(&store.body()).map_err(DecodeError::Json)
}
