use super::handle::RouteVars;
use crate::writer::mime;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::Method;
use std::collections::HashMap;
use std::fmt;

/// Failure while parsing form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A `%` escape that is not followed by two hex digits.
    MalformedEscape { pair: String },
    /// A urlencoded body that is not UTF-8.
    InvalidEncoding,
    /// `Content-Type` is not valid header text.
    InvalidContentType,
    /// Urlencoded body larger than the form limit.
    TooLarge { limit: usize },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MalformedEscape { pair } => write!(f, "invalid URL escape in '{pair}'"),
            FormError::InvalidEncoding => write!(f, "form body is not valid UTF-8"),
            FormError::InvalidContentType => write!(f, "malformed Content-Type header"),
            FormError::TooLarge { limit } => write!(f, "form body larger than {limit} bytes"),
        }
    }
}

impl std::error::Error for FormError {}

fn valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let ok = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !ok {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Parse `a=1&b=2` pairs in order.
///
/// Pairs with a malformed escape are skipped; the first such failure is
/// returned next to everything that did parse.
pub fn parse_urlencoded(input: &str) -> (Vec<(String, String)>, Option<FormError>) {
    let mut pairs = Vec::new();
    let mut first_err = None;
    for raw in input.split('&').filter(|p| !p.is_empty()) {
        if !valid_escapes(raw) {
            first_err.get_or_insert_with(|| FormError::MalformedEscape {
                pair: raw.to_string(),
            });
            continue;
        }
        if let Some((k, v)) = url::form_urlencoded::parse(raw.as_bytes()).next() {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    (pairs, first_err)
}

fn carries_form_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Collect form values from the query string and a urlencoded body.
///
/// For a repeated name the first occurrence wins, and body values win over
/// query values. Parsing is best effort: the returned map holds everything
/// that parsed, the error (if any) reports the first failure.
pub fn parse_form(
    parts: &Parts,
    body: &[u8],
    max_form_bytes: usize,
) -> (HashMap<String, String>, Option<FormError>) {
    let mut values = HashMap::new();
    let mut first_err: Option<FormError> = None;

    if carries_form_body(&parts.method) {
        match parts.headers.get(CONTENT_TYPE).map(|v| v.to_str()) {
            Some(Err(_)) => {
                first_err = Some(FormError::InvalidContentType);
            }
            Some(Ok(ct)) if mime::essence(ct) == mime::APPLICATION_FORM => {
                if body.len() > max_form_bytes {
                    first_err = Some(FormError::TooLarge {
                        limit: max_form_bytes,
                    });
                } else {
                    match std::str::from_utf8(body) {
                        Ok(text) => {
                            let (pairs, err) = parse_urlencoded(text);
                            for (k, v) in pairs {
                                values.entry(k).or_insert(v);
                            }
                            first_err = err;
                        }
                        Err(_) => first_err = Some(FormError::InvalidEncoding),
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(query) = parts.uri.query() {
        let (pairs, err) = parse_urlencoded(query);
        for (k, v) in pairs {
            values.entry(k).or_insert(v);
        }
        if first_err.is_none() {
            first_err = err;
        }
    }

    (values, first_err)
}

/// Overlay router variables on top of form values.
pub fn merge_route_vars(values: &mut HashMap<String, String>, route: Option<&RouteVars>) {
    if let Some(route) = route {
        for (k, v) in route.iter() {
            values.insert(k.clone(), v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(method: Method, uri: &str, content_type: Option<&str>) -> Parts {
        let mut b = http::Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            b = b.header(CONTENT_TYPE, ct);
        }
        b.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_query_values() {
        let p = parts(Method::GET, "/p?x=1&y=hello%20world&x=2", None);
        let (values, err) = parse_form(&p, b"", 1024);
        assert!(err.is_none());
        assert_eq!(values["x"], "1");
        assert_eq!(values["y"], "hello world");
    }

    #[test]
    fn test_body_wins_over_query() {
        let p = parts(Method::POST, "/p?id=1&q=s", Some(mime::APPLICATION_FORM));
        let (values, err) = parse_form(&p, b"id=9&name=a+b", 1024);
        assert!(err.is_none());
        assert_eq!(values["id"], "9");
        assert_eq!(values["name"], "a b");
        assert_eq!(values["q"], "s");
    }

    #[test]
    fn test_body_ignored_for_get_and_other_types() {
        let p = parts(Method::GET, "/p", Some(mime::APPLICATION_FORM));
        assert!(parse_form(&p, b"a=1", 1024).0.is_empty());
        let p = parts(Method::POST, "/p", Some(mime::APPLICATION_JSON));
        assert!(parse_form(&p, b"a=1", 1024).0.is_empty());
    }

    #[test]
    fn test_malformed_escape_keeps_other_pairs() {
        let p = parts(Method::GET, "/p?a=%zz&b=2", None);
        let (values, err) = parse_form(&p, b"", 1024);
        assert_eq!(values.get("b").map(String::as_str), Some("2"));
        assert!(!values.contains_key("a"));
        assert_eq!(
            err,
            Some(FormError::MalformedEscape {
                pair: "a=%zz".to_string()
            })
        );
    }

    #[test]
    fn test_non_utf8_body() {
        let p = parts(Method::POST, "/p", Some(mime::APPLICATION_FORM));
        let (_, err) = parse_form(&p, &[0xff, 0xfe], 1024);
        assert_eq!(err, Some(FormError::InvalidEncoding));
    }

    #[test]
    fn test_form_limit() {
        let p = parts(Method::POST, "/p?k=v", Some(mime::APPLICATION_FORM));
        let (values, err) = parse_form(&p, b"aaaaaaaaaa=1", 4);
        assert_eq!(err, Some(FormError::TooLarge { limit: 4 }));
        assert_eq!(values["k"], "v");
    }

    #[test]
    fn test_route_vars_override() {
        let mut values = HashMap::from([("id".to_string(), "9".to_string())]);
        let route: RouteVars = [("id", "7")].into_iter().collect();
        merge_route_vars(&mut values, Some(&route));
        assert_eq!(values["id"], "7");
    }
}
