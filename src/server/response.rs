use bytes::Bytes;
use dashmap::DashMap;
use http::header::{CONTENT_LENGTH, DATE, SERVER};
use http::StatusCode;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

/// Upper bound on distinct header lines kept for the process lifetime.
pub const MAX_INTERNED_HEADERS: usize = 4096;

static HEADER_LINES: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);

/// Reason phrase for a status code, `"Unknown"` for unregistered codes.
#[must_use]
pub fn status_reason(code: StatusCode) -> &'static str {
    code.canonical_reason().unwrap_or("Unknown")
}

/// `"Name: value"` as a `'static` line for the transport.
///
/// Lines are interned, so repeated headers cost one lookup. Once
/// [`MAX_INTERNED_HEADERS`] distinct lines are held, new lines are leaked
/// without being added to the table.
fn header_line(line: String) -> &'static str {
    if let Some(found) = HEADER_LINES.get(&line) {
        return *found;
    }
    if HEADER_LINES.len() >= MAX_INTERNED_HEADERS {
        debug!(limit = MAX_INTERNED_HEADERS, "Header table full, line not interned");
        return Box::leak(line.into_boxed_str());
    }
    *HEADER_LINES
        .entry(line.clone())
        .or_insert_with(|| &*Box::leak(line.into_boxed_str()))
}

/// Copy a buffered response into the transport response.
///
/// `Content-Length`, `Date` and `Server` are written by the transport
/// itself and are skipped here.
pub fn write_response(res: &mut Response, response: http::Response<Bytes>) {
    let (parts, body) = response.into_parts();
    res.status_code(parts.status.as_u16() as usize, status_reason(parts.status));
    for (name, value) in &parts.headers {
        if name == CONTENT_LENGTH || name == DATE || name == SERVER {
            continue;
        }
        let Ok(value) = value.to_str() else {
            warn!(header = %name, "Dropping non-ASCII response header");
            continue;
        };
        res.header(header_line(format!("{}: {}", name.as_str(), value)));
    }
    res.body_vec(body.to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(StatusCode::OK), "OK");
        assert_eq!(status_reason(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(status_reason(StatusCode::TOO_MANY_REQUESTS), "Too Many Requests");
        assert_eq!(
            status_reason(StatusCode::from_u16(599).unwrap()),
            "Unknown"
        );
    }

    #[test]
    fn test_header_lines_interned_until_table_full() {
        let a = header_line("X-Interned-Test: one".to_string());
        let b = header_line("X-Interned-Test: one".to_string());
        assert_eq!(a, "X-Interned-Test: one");
        assert!(std::ptr::eq(a, b));

        for i in 0..MAX_INTERNED_HEADERS {
            header_line(format!("Location: /items/{i}"));
        }
        assert_eq!(HEADER_LINES.len(), MAX_INTERNED_HEADERS);

        let late = header_line("Location: /items/new-one".to_string());
        assert_eq!(late, "Location: /items/new-one");
        assert!(!HEADER_LINES.contains_key("Location: /items/new-one"));
        assert_eq!(HEADER_LINES.len(), MAX_INTERNED_HEADERS);

        // Lines interned before the table filled are still shared
        assert!(std::ptr::eq(header_line("X-Interned-Test: one".to_string()), a));
    }
}
