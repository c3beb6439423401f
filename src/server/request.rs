use http::Method;
use may_minihttp::Request;
use std::io::Read;
use tracing::debug;

/// Convert a `may_minihttp` request into an [`http::Request`] and hand it to
/// `f` together with a reader over the unread body.
///
/// Method, target and headers are copied out first because reading the body
/// consumes the transport request. The body itself is not buffered here;
/// the request builder applies its own size limit while reading.
///
/// # Errors
///
/// Returns the `http` error when the method, target or a header is not
/// valid HTTP.
pub fn with_http_request<T>(
    req: Request,
    f: impl FnOnce(http::Request<&mut dyn Read>) -> T,
) -> Result<T, http::Error> {
    let mut builder = http::Request::builder()
        .method(Method::from_bytes(req.method().as_bytes())?)
        .uri(req.path());
    for h in req.headers() {
        builder = builder.header(h.name, h.value);
    }
    debug!(
        method = %req.method(),
        path = %req.path(),
        headers_count = req.headers().len(),
        "HTTP request parsed"
    );

    let mut body = req.body();
    let request = builder.body(&mut body as &mut dyn Read)?;
    Ok(f(request))
}
