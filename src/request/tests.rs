use super::*;
use crate::dispatch::HasStatusCode;
use crate::platform::{HostedPlatform, NamespaceError, NamespaceResolver, StandardPlatform};
use crate::store::{Environment, Key, Store};
use crate::writer::{mime, ResponseWriter};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use serde::Deserialize;
use std::io::{self, Read};
use std::sync::{Arc, Mutex};

fn post(uri: &str, content_type: &str, body: &'static [u8]) -> http::Request<&'static [u8]> {
    http::Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .unwrap()
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
    }
}

#[test]
fn test_build_populates_core_keys() {
    let writer = ResponseWriter::new();
    let report = RequestBuilder::default().build(
        writer.clone(),
        post("/pets?name=rex", mime::APPLICATION_JSON, b"{\"a\":1}"),
    );
    assert!(report.is_clean());
    let store = report.store;
    for key in [
        Key::Environment,
        Key::Request,
        Key::ResponseWriter,
        Key::RequestVars,
        Key::RequestBody,
    ] {
        assert!(store.contains(key), "missing {key}");
    }
    assert!(!store.contains(Key::Namespace));
    assert_eq!(store.environment(), Environment::Standard);
    assert_eq!(store.body_string(), "{\"a\":1}");
    assert_eq!(store.form_value("name"), "rex");
    assert!(*store.request().unwrap().method() == Method::POST);
}

#[test]
fn test_router_vars_win_over_form_values() {
    let mut req = post("/pets/7?id=1", mime::APPLICATION_FORM, b"id=9&kind=dog");
    req.extensions_mut()
        .insert([("id", "7")].into_iter().collect::<RouteVars>());
    let report = RequestBuilder::default().build(ResponseWriter::new(), req);
    assert!(report.is_clean());
    assert_eq!(report.store.form_value("id"), "7");
    assert_eq!(report.store.form_value("kind"), "dog");
}

#[test]
fn test_body_is_rereadable_after_form_parse() {
    let report = RequestBuilder::default().build(
        ResponseWriter::new(),
        post("/f", mime::APPLICATION_FORM, b"a=1"),
    );
    let handle = report.store.request().unwrap().clone();
    let mut text = String::new();
    handle.body_reader().read_to_string(&mut text).unwrap();
    assert_eq!(text, "a=1");
    assert_eq!(report.store.body_string(), "a=1");
    assert_eq!(report.store.form_value("a"), "1");
}

#[test]
fn test_request_id_header_is_reused() {
    let id = crate::ids::RequestId::new();
    let req = http::Request::builder()
        .header("x-request-id", id.to_string())
        .body(io::empty())
        .unwrap();
    let report = RequestBuilder::default().build(ResponseWriter::new(), req);
    assert_eq!(report.store.request().unwrap().id(), id);
}

#[test]
fn test_body_too_large() {
    let report = RequestBuilder::default()
        .with_max_body_bytes(4)
        .build(ResponseWriter::new(), post("/x", mime::TEXT_PLAIN, b"0123456789"));
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], BuildError::BodyTooLarge { limit: 4 }));
    assert_eq!(report.errors[0].status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!report.store.has_body());
    assert!(report.store.body().is_empty());
    assert!(report.store.request().unwrap().body().is_empty());
}

#[test]
fn test_body_read_failure_is_best_effort() {
    let req = http::Request::builder()
        .method(Method::PUT)
        .uri("/x?q=1")
        .body(FailingReader)
        .unwrap();
    let report = RequestBuilder::default().build(ResponseWriter::new(), req);
    assert!(matches!(report.errors[0], BuildError::BodyRead(_)));
    assert_eq!(report.errors[0].status_code(), StatusCode::BAD_REQUEST);
    assert!(!report.store.has_body());
    assert_eq!(report.store.form_value("q"), "1");
    assert!(report.store.writer().is_some());
    assert!(report.errors[0].is_connection_lost());
    assert!(report.store.is_cancelled());
}

#[test]
fn test_body_read_failure_without_disconnect_keeps_connection() {
    struct Garbled;
    impl Read for Garbled {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad chunk"))
        }
    }
    let req = http::Request::put("/x").body(Garbled).unwrap();
    let writer = ResponseWriter::new();
    let report = RequestBuilder::default().build(writer.clone(), req);
    assert!(matches!(report.errors[0], BuildError::BodyRead(_)));
    assert!(!report.errors[0].is_connection_lost());
    assert!(!report.store.is_cancelled());
    assert!(!writer.is_aborted());
}

#[test]
fn test_form_error_keeps_partial_vars() {
    let report = RequestBuilder::default().build(
        ResponseWriter::new(),
        post("/x", mime::APPLICATION_FORM, b"good=1&bad=%G0"),
    );
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors[0],
        BuildError::Form(FormError::MalformedEscape { .. })
    ));
    assert_eq!(report.store.form_value("good"), "1");
    assert_eq!(report.store.form_value("bad"), "");
    assert!(report.store.has_body());
}

#[test]
fn test_namespace_resolver_standard() {
    let resolver: Arc<dyn NamespaceResolver> =
        Arc::new(|_: &Store| -> Result<String, NamespaceError> { Ok("tenant-1".into()) });
    let report = RequestBuilder::new(Arc::new(StandardPlatform))
        .with_namespace_resolver(resolver)
        .build(ResponseWriter::new(), http::Request::new(io::empty()));
    assert_eq!(report.store.namespace(), Some("tenant-1"));
}

#[test]
fn test_namespace_failure_is_reported_to_hook() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let hook: DiagnosticHook = Arc::new(move |_store: &Store, err: &BuildError| {
        sink.lock().unwrap().push(err.to_string());
    });
    let resolver: Arc<dyn NamespaceResolver> =
        Arc::new(|_: &Store| -> Result<String, NamespaceError> { Ok("no spaces allowed".into()) });

    let report = RequestBuilder::new(Arc::new(HostedPlatform::default()))
        .with_namespace_resolver(resolver)
        .with_diagnostic_hook(hook)
        .build(ResponseWriter::new(), http::Request::new(io::empty()));

    assert_eq!(report.store.environment(), Environment::Hosted);
    assert!(report.store.namespace().is_none());
    assert!(matches!(report.errors[0], BuildError::Namespace(_)));
    assert_eq!(
        report.errors[0].status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["invalid namespace 'no spaces allowed'"]
    );
}

#[test]
fn test_base_extensions_are_copied_per_request() {
    #[derive(Clone, Debug, PartialEq)]
    struct Tenant(&'static str);

    let mut ext = http::Extensions::new();
    ext.insert(Tenant("acme"));
    let builder = RequestBuilder::default().with_extensions(ext);
    let a = builder
        .build(ResponseWriter::new(), http::Request::new(io::empty()))
        .store;
    let b = a.with_extension(Tenant("other"));
    assert_eq!(a.extension::<Tenant>(), Some(&Tenant("acme")));
    assert_eq!(b.extension::<Tenant>(), Some(&Tenant("other")));
}

#[test]
fn test_decode_and_reread() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Pet {
        name: String,
    }

    let report = RequestBuilder::default().build(
        ResponseWriter::new(),
        post("/pets", mime::APPLICATION_JSON, b"{\"name\":\"rex\"}"),
    );
    let pet: Pet = decode(&report.store).unwrap();
    assert_eq!(pet.name, "rex");
    let again: serde_json::Value = decode(&report.store).unwrap();
    assert_eq!(again["name"], "rex");
    assert_eq!(report.store.body_string(), "{\"name\":\"rex\"}");
}

#[test]
fn test_decode_errors() {
    assert!(matches!(
        decode::<serde_json::Value>(&Store::new()),
        Err(DecodeError::NoRequestBody)
    ));
    let report = RequestBuilder::default().build(
        ResponseWriter::new(),
        post("/pets", mime::APPLICATION_JSON, b"{not json"),
    );
    let err = decode::<serde_json::Value>(&report.store).unwrap_err();
    assert!(matches!(err, DecodeError::Json(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_build_policy_parse() {
    assert_eq!(BuildPolicy::parse("Strict"), BuildPolicy::Strict);
    assert_eq!(BuildPolicy::parse("best-effort"), BuildPolicy::BestEffort);
    assert_eq!(BuildPolicy::parse(""), BuildPolicy::BestEffort);
}
