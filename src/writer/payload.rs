use bytes::Bytes;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};

/// Body handed to a writer helper.
///
/// The four shapes a handler can pass: text, raw bytes, a stream to copy,
/// or any other value rendered with its `Display` implementation.
pub enum Payload {
    Text(Cow<'static, str>),
    Bytes(Bytes),
    Reader(Box<dyn Read + Send>),
    Fallback(Box<dyn fmt::Display + Send>),
}

impl Payload {
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Payload::Reader(Box::new(reader))
    }

    pub fn display<T: fmt::Display + Send + 'static>(value: T) -> Self {
        Payload::Fallback(Box::new(value))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Payload::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Payload::Reader(_) => f.write_str("Reader(..)"),
            Payload::Fallback(v) => f.debug_tuple("Fallback").field(&v.to_string()).finish(),
        }
    }
}

impl From<&'static str> for Payload {
    fn from(s: &'static str) -> Self {
        Payload::Text(Cow::Borrowed(s))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(Cow::Owned(s))
    }
}

impl From<&String> for Payload {
    fn from(s: &String) -> Self {
        Payload::Text(Cow::Owned(s.clone()))
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(b))
    }
}

/// Serialize a payload into `w`.
pub fn write_payload<W: Write + ?Sized>(w: &mut W, payload: Payload) -> io::Result<()> {
    match payload {
        Payload::Text(s) => w.write_all(s.as_bytes()),
        Payload::Bytes(b) => w.write_all(&b),
        Payload::Reader(mut r) => io::copy(&mut r, w).map(|_| ()),
        Payload::Fallback(v) => write!(w, "{v}"),
    }
}
