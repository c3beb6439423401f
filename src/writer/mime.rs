//! Content types emitted by the writer helpers.

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_CSS: &str = "text/css";
pub const TEXT_XML_UTF8: &str = "text/xml; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=utf-8";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const FONT_TRUETYPE: &str = "application/x-font-truetype";

/// Media type without parameters, lowercased: `"Application/JSON; charset=utf-8"` → `"application/json"`.
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// True for `application/json` and `+json` suffixed types.
#[must_use]
pub fn is_json(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence == APPLICATION_JSON || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essence() {
        assert_eq!(essence("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(essence(" text/plain "), "text/plain");
        assert_eq!(essence(""), "");
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(APPLICATION_JSON_UTF8));
        assert!(is_json("application/problem+json"));
        assert!(!is_json(APPLICATION_FORM));
    }
}
