use super::error::WriteError;
use super::mime;
use super::payload::{write_payload, Payload};
use super::response::ResponseWriter;
use crate::store::Store;
use bytes::Bytes;
use http::header::LOCATION;
use http::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// External image encoder.
///
/// Pixel formats and compression settings belong to the encoder; the writer
/// only needs the content type and a sink.
pub trait ImageEncoder {
    fn content_type(&self) -> &str;
    fn encode(&self, out: &mut dyn Write) -> io::Result<()>;
}

fn writer_of(store: &Store) -> Result<ResponseWriter, WriteError> {
    store.writer().cloned().ok_or(WriteError::NoWriter)
}

/// Write status + content type, recording the code in the store.
fn start(
    store: &mut Store,
    code: StatusCode,
    content_type: &str,
) -> Result<ResponseWriter, WriteError> {
    let writer = writer_of(store)?;
    writer.begin(code, Some(content_type))?;
    store.set_code(code);
    Ok(writer)
}

fn send(
    store: &mut Store,
    code: StatusCode,
    content_type: &str,
    payload: Payload,
) -> Result<(), WriteError> {
    let mut writer = start(store, code, content_type)?;
    write_payload(&mut writer, payload)?;
    Ok(())
}

/// Write `payload` as `text/plain`.
pub fn text(store: &mut Store, code: StatusCode, payload: impl Into<Payload>) -> Result<(), WriteError> {
    send(store, code, mime::TEXT_PLAIN, payload.into())
}

/// Write an error's display text as the response.
pub fn error(store: &mut Store, code: StatusCode, err: &dyn fmt::Display) -> Result<(), WriteError> {
    text(store, code, err.to_string())
}

/// Write the canonical reason phrase for `code`.
pub fn status(store: &mut Store, code: StatusCode) -> Result<(), WriteError> {
    text(store, code, code.canonical_reason().unwrap_or(""))
}

pub fn html(store: &mut Store, code: StatusCode, payload: impl Into<Payload>) -> Result<(), WriteError> {
    send(store, code, mime::TEXT_HTML, payload.into())
}

pub fn css(store: &mut Store, code: StatusCode, payload: impl Into<Payload>) -> Result<(), WriteError> {
    send(store, code, mime::TEXT_CSS, payload.into())
}

/// Serialize `value` as JSON, newline terminated.
pub fn json<T: Serialize + ?Sized>(
    store: &mut Store,
    code: StatusCode,
    value: &T,
) -> Result<(), WriteError> {
    let mut writer = start(store, code, mime::APPLICATION_JSON_UTF8)?;
    serde_json::to_writer(&mut writer, value).map_err(|e| {
        // Sink failures surface as the writer's own error, not a JSON one
        if e.io_error_kind().is_some() {
            WriteError::from(io::Error::from(e))
        } else {
            WriteError::Json(e)
        }
    })?;
    writer.write_body(b"\n")?;
    Ok(())
}

/// Write an already-encoded JSON document unchanged.
pub fn json_payload(
    store: &mut Store,
    code: StatusCode,
    payload: impl Into<Payload>,
) -> Result<(), WriteError> {
    send(store, code, mime::APPLICATION_JSON_UTF8, payload.into())
}

/// Write an already-encoded XML document under `text/xml`.
pub fn xml(store: &mut Store, code: StatusCode, payload: impl Into<Payload>) -> Result<(), WriteError> {
    send(store, code, mime::TEXT_XML_UTF8, payload.into())
}

/// Raw bytes with an explicit content type.
pub fn bytes(
    store: &mut Store,
    code: StatusCode,
    content_type: &str,
    data: impl Into<Bytes>,
) -> Result<(), WriteError> {
    send(store, code, content_type, Payload::Bytes(data.into()))
}

/// Serve a TrueType font.
pub fn font(store: &mut Store, data: impl Into<Bytes>) -> Result<(), WriteError> {
    bytes(store, StatusCode::OK, mime::FONT_TRUETYPE, data)
}

/// Encode an image through an external encoder.
pub fn image(store: &mut Store, code: StatusCode, encoder: &dyn ImageEncoder) -> Result<(), WriteError> {
    let mut writer = start(store, code, encoder.content_type())?;
    encoder.encode(&mut writer).map_err(|e| match WriteError::from(e) {
        WriteError::Io(e) => WriteError::Encode(e),
        other => other,
    })
}

/// `204 No Content`.
pub fn no_content(store: &mut Store) -> Result<(), WriteError> {
    start(store, StatusCode::NO_CONTENT, mime::TEXT_PLAIN).map(|_| ())
}

/// `401 Unauthorized` with the canonical reason.
pub fn unauthorized(store: &mut Store) -> Result<(), WriteError> {
    status(store, StatusCode::UNAUTHORIZED)
}

/// Redirect to `location`.
///
/// GET and HEAD requests get a short HTML body linking to the target.
pub fn redirect(store: &mut Store, location: &str, code: StatusCode) -> Result<(), WriteError> {
    let writer = writer_of(store)?;
    writer.set_header(LOCATION, location)?;
    let method = store.request().map(|r| r.method().clone());
    match method {
        Some(m) if m == Method::GET || m == Method::HEAD => {
            let reason = code.canonical_reason().unwrap_or("Redirect");
            let body = format!("<a href=\"{}\">{}</a>.\n", escape_html(location), reason);
            html(store, code, body)
        }
        _ => {
            writer.write_header(code)?;
            store.set_code(code);
            Ok(())
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
